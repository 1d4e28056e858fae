use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Tournament settings, loadable from JSON.
///
/// The move budget is stored in the file as `move_time_budget_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    /// Number of games to play
    pub games_count: usize,

    /// Wall-clock time a strategy gets to decide a single move
    #[serde(rename = "move_time_budget_ms", with = "duration_ms")]
    pub move_time_budget: Duration,

    /// Upper bound on games played concurrently
    pub parallel_games: usize,

    /// Print every finished board
    pub verbose: bool,

    /// Seed for the fallback move generator
    pub seed: Option<u64>,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        TournamentConfig {
            games_count: 1000,
            move_time_budget: Duration::from_secs(1),
            parallel_games: 1,
            verbose: false,
            seed: None,
        }
    }
}

impl TournamentConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: TournamentConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.move_time_budget.is_zero() {
            return Err(ConfigError::Validation(
                "move_time_budget_ms must be > 0".into(),
            ));
        }
        if self.parallel_games == 0 {
            return Err(ConfigError::Validation(
                "parallel_games must be > 0".into(),
            ));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

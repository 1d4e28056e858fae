use std::path::PathBuf;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors that stop a tournament. Strategy faults are not among them; those
/// are absorbed by fallback moves.
#[derive(Debug, thiserror::Error)]
pub enum TournamentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("game task failed: {0}")]
    GameTask(#[from] tokio::task::JoinError),
}

/// Errors that can occur while loading a strategy plugin.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("failed to load library {path}: {source}")]
    Load {
        path: PathBuf,
        source: libloading::Error,
    },

    #[error("failed to find create_strategy function: {0}")]
    MissingSymbol(libloading::Error),

    #[error("create_strategy returned null")]
    NullPlugin,
}

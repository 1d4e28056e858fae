use crate::config::TournamentConfig;
use crate::error::{ConfigError, TournamentError};
use crate::game::{Game, GameStatus, Player};
use crate::strategy::{RandomStrategy, Strategy};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

/// Tally key for drawn games
pub const TIE: &str = "tie";

/// A strategy entered into a tournament under a display name
#[derive(Clone)]
pub struct Competitor {
    name: String,
    strategy: Arc<dyn Strategy>,
}

impl Competitor {
    pub fn new<S: Strategy + 'static>(name: impl Into<String>, strategy: S) -> Self {
        Self::from_arc(name, Arc::new(strategy))
    }

    pub fn from_arc(name: impl Into<String>, strategy: Arc<dyn Strategy>) -> Self {
        Competitor {
            name: name.into(),
            strategy,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Competitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Competitor").field("name", &self.name).finish()
    }
}

/// Why a strategy's decision was replaced by a fallback move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fault {
    Timeout,
    InvalidMove(usize),
    Panicked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FaultCounts {
    pub timeouts: u64,
    pub invalid_moves: u64,
    pub panics: u64,
}

impl FaultCounts {
    fn add(&mut self, fault: Fault) {
        match fault {
            Fault::Timeout => self.timeouts += 1,
            Fault::InvalidMove(_) => self.invalid_moves += 1,
            Fault::Panicked => self.panics += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.timeouts + self.invalid_moves + self.panics
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GameOutcome {
    Won { winner: String },
    Drawn,
}

impl GameOutcome {
    /// Key this outcome is tallied under
    pub fn tally_key(&self) -> &str {
        match self {
            GameOutcome::Won { winner } => winner,
            GameOutcome::Drawn => TIE,
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOutcome::Won { winner } => write!(f, "{} wins", winner),
            GameOutcome::Drawn => write!(f, "tie"),
        }
    }
}

/// Summary of one finished game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    pub index: usize,
    /// Competitor seated as player one, i.e. moving first
    pub first: String,
    pub second: String,
    pub outcome: GameOutcome,
    pub moves: usize,
}

/// Everything a game task hands back to the runner
#[derive(Debug)]
pub struct GameReport {
    pub record: GameRecord,
    pub faults: Vec<(String, Fault)>,
    pub final_state: Game,
}

/// A single game between two seated competitors.
///
/// Every decision runs on a thread of its own under the move budget, so a
/// strategy that never returns cannot delay anyone else's decisions. Late,
/// invalid or panicking decisions are replaced by a random valid column, so
/// a game always runs to completion.
pub struct Match {
    index: usize,
    seats: [Competitor; 2],
    fallback: Arc<RandomStrategy>,
    time_per_move: Duration,
    game: Game,
    faults: Vec<(String, Fault)>,
}

impl Match {
    pub fn new(
        index: usize,
        player_one: Competitor,
        player_two: Competitor,
        fallback: Arc<RandomStrategy>,
        time_per_move: Duration,
    ) -> Self {
        Match {
            index,
            seats: [player_one, player_two],
            fallback,
            time_per_move,
            game: Game::new(),
            faults: Vec::new(),
        }
    }

    fn seat(&self, player: Player) -> &Competitor {
        match player {
            Player::One => &self.seats[0],
            Player::Two => &self.seats[1],
        }
    }

    /// Result of the game so far, `None` while it is still in progress
    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.game.status() {
            GameStatus::InProgress => None,
            GameStatus::Won(player) => Some(GameOutcome::Won {
                winner: self.seat(player).name().to_string(),
            }),
            GameStatus::Drawn => Some(GameOutcome::Drawn),
        }
    }

    pub async fn play(mut self) -> GameReport {
        // An in-progress game always has a valid column and every column
        // played here has been validated, so the loop only ends on a result.
        let outcome = loop {
            if let Some(outcome) = self.outcome() {
                break outcome;
            }
            let Some(column) = self.next_move().await else {
                unreachable!("game {} in progress without a valid column", self.index);
            };
            if let Err(err) = self.game.apply_move(column) {
                unreachable!("game {}: validated column {column} rejected: {err}", self.index);
            }
        };

        GameReport {
            record: GameRecord {
                index: self.index,
                first: self.seats[0].name().to_string(),
                second: self.seats[1].name().to_string(),
                outcome,
                moves: self.game.move_count(),
            },
            faults: self.faults,
            final_state: self.game,
        }
    }

    /// Column for the player to move, or a random valid one if the
    /// competitor's decision is late, invalid or panics.
    async fn next_move(&mut self) -> Option<usize> {
        let competitor = self.seat(self.game.current_player()).clone();
        let snapshot = self.game.snapshot();
        let strategy = Arc::clone(&competitor.strategy);

        let (tx, rx) = oneshot::channel();
        let start = Instant::now();
        thread::spawn(move || {
            // The receiver is gone if the decision came too late
            let _ = tx.send(strategy.decide(snapshot));
        });
        let decision = tokio::time::timeout(self.time_per_move, rx).await;
        let elapsed = start.elapsed();

        let fault = match decision {
            Ok(Ok(column)) if self.game.is_valid_move(column) => {
                debug!(
                    game = self.index,
                    competitor = competitor.name(),
                    column,
                    ?elapsed,
                    "move decided"
                );
                return Some(column);
            }
            Ok(Ok(column)) => {
                warn!(
                    game = self.index,
                    competitor = competitor.name(),
                    column,
                    "invalid move, performing random move"
                );
                Fault::InvalidMove(column)
            }
            Ok(Err(_)) => {
                // The sender was dropped without a column: the decision panicked
                warn!(
                    game = self.index,
                    competitor = competitor.name(),
                    "strategy panicked, performing random move"
                );
                Fault::Panicked
            }
            Err(_) => {
                // The abandoned thread keeps running; its send fails once it
                // finishes.
                warn!(
                    game = self.index,
                    competitor = competitor.name(),
                    limit = ?self.time_per_move,
                    "time out limit exceeded, performing random move"
                );
                Fault::Timeout
            }
        };

        self.faults.push((competitor.name().to_string(), fault));
        self.fallback.pick(&self.game)
    }
}

/// Win counts per competitor plus per-game records
#[derive(Debug, Clone, Default, Serialize)]
pub struct TournamentResult {
    tally: BTreeMap<String, u64>,
    faults: BTreeMap<String, FaultCounts>,
    games: Vec<GameRecord>,
}

impl TournamentResult {
    fn new(competitors: &[Competitor; 2]) -> Self {
        let mut result = TournamentResult::default();
        for competitor in competitors {
            result.tally.insert(competitor.name().to_string(), 0);
            result
                .faults
                .insert(competitor.name().to_string(), FaultCounts::default());
        }
        result.tally.insert(TIE.to_string(), 0);
        result
    }

    fn record(&mut self, report: GameReport) {
        *self
            .tally
            .entry(report.record.outcome.tally_key().to_string())
            .or_insert(0) += 1;
        for (name, fault) in report.faults {
            self.faults.entry(name).or_default().add(fault);
        }
        self.games.push(report.record);
    }

    pub fn tally(&self) -> &BTreeMap<String, u64> {
        &self.tally
    }

    pub fn wins(&self, name: &str) -> u64 {
        self.tally.get(name).copied().unwrap_or(0)
    }

    pub fn ties(&self) -> u64 {
        self.wins(TIE)
    }

    pub fn total_games(&self) -> u64 {
        self.tally.values().sum()
    }

    pub fn faults(&self, name: &str) -> FaultCounts {
        self.faults.get(name).copied().unwrap_or_default()
    }

    /// Finished games in index order
    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn display(&self) {
        println!("\nTournament Results:");
        println!("==================");
        for (name, wins) in &self.tally {
            println!("{}: {}", name, wins);
        }
        for (name, faults) in &self.faults {
            if faults.total() > 0 {
                println!(
                    "{} faults: {} timeouts, {} invalid moves, {} panics",
                    name, faults.timeouts, faults.invalid_moves, faults.panics
                );
            }
        }
    }
}

/// Plays a series of games between two competitors, swapping who moves
/// first after every game.
pub struct TournamentRunner {
    config: TournamentConfig,
    competitors: [Competitor; 2],
    fallback: Arc<RandomStrategy>,
}

impl TournamentRunner {
    pub fn new(
        config: TournamentConfig,
        competitors: Vec<Competitor>,
    ) -> Result<Self, TournamentError> {
        config.validate()?;

        let competitors: [Competitor; 2] = competitors.try_into().map_err(|c: Vec<Competitor>| {
            ConfigError::Validation(format!(
                "exactly two competitors are required, got {}",
                c.len()
            ))
        })?;

        for competitor in &competitors {
            if competitor.name().is_empty() {
                return Err(
                    ConfigError::Validation("competitor name must not be empty".into()).into(),
                );
            }
            if competitor.name() == TIE {
                return Err(ConfigError::Validation(format!(
                    "competitor name '{}' is reserved for drawn games",
                    TIE
                ))
                .into());
            }
        }
        if competitors[0].name() == competitors[1].name() {
            return Err(ConfigError::Validation(format!(
                "competitor names must be distinct, both are '{}'",
                competitors[0].name()
            ))
            .into());
        }

        let fallback = match config.seed {
            Some(seed) => RandomStrategy::with_seed(seed),
            None => RandomStrategy::new(),
        };

        Ok(TournamentRunner {
            config,
            competitors,
            fallback: Arc::new(fallback),
        })
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    pub fn competitors(&self) -> &[Competitor; 2] {
        &self.competitors
    }

    /// Seating for game `index` as (player one, player two). The first
    /// competitor moves first in even games, the second in odd games.
    pub fn seating(&self, index: usize) -> (&Competitor, &Competitor) {
        let [a, b] = &self.competitors;
        if index % 2 == 0 { (a, b) } else { (b, a) }
    }

    pub async fn run(&self) -> Result<TournamentResult, TournamentError> {
        let total = self.config.games_count;
        let mut result = TournamentResult::new(&self.competitors);
        let mut games = JoinSet::new();

        info!(
            games = total,
            first = self.competitors[0].name(),
            second = self.competitors[1].name(),
            budget = ?self.config.move_time_budget,
            "tournament starting"
        );

        for index in 0..total {
            if games.len() >= self.config.parallel_games {
                if let Some(joined) = games.join_next().await {
                    self.collect(&mut result, joined)?;
                }
            }

            let (first, second) = self.seating(index);
            let game = Match::new(
                index,
                first.clone(),
                second.clone(),
                Arc::clone(&self.fallback),
                self.config.move_time_budget,
            );
            games.spawn(game.play());
        }

        while let Some(joined) = games.join_next().await {
            self.collect(&mut result, joined)?;
        }

        result.games.sort_by_key(|game| game.index);
        Ok(result)
    }

    fn collect(
        &self,
        result: &mut TournamentResult,
        joined: Result<GameReport, JoinError>,
    ) -> Result<(), TournamentError> {
        let report = joined?;
        let done = result.games.len() + 1;

        info!(
            "game {}/{} (#{}): {} after {} moves",
            done,
            self.config.games_count,
            report.record.index + 1,
            report.record.outcome,
            report.record.moves
        );
        if self.config.verbose {
            println!(
                "\nGame {}: {} (X) vs {} (O)",
                report.record.index + 1,
                report.record.first,
                report.record.second
            );
            println!("{}", report.final_state.display_board());
        }

        result.record(report);
        Ok(())
    }
}

use crate::game::{Game, Snapshot};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::sync::{Mutex, PoisonError};

/// Trait that all move-selection strategies must implement.
///
/// A strategy only ever sees a [`Snapshot`], so it cannot affect the game
/// being played. It may run on a worker thread and be abandoned if it
/// exceeds the move budget; it should therefore not rely on shared mutable
/// state.
pub trait Strategy: Send + Sync {
    /// Pick the column to play. The harness replaces columns that are not
    /// currently valid with a random valid one.
    fn decide(&self, snapshot: Snapshot) -> usize;
}

impl<F> Strategy for F
where
    F: Fn(Snapshot) -> usize + Send + Sync,
{
    fn decide(&self, snapshot: Snapshot) -> usize {
        self(snapshot)
    }
}

/// Plays a uniformly random valid column
pub struct RandomStrategy {
    rng: Mutex<StdRng>,
}

impl RandomStrategy {
    pub fn new() -> Self {
        RandomStrategy {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible sequence of choices
    pub fn with_seed(seed: u64) -> Self {
        RandomStrategy {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Random valid column, or `None` once the board is full
    pub fn pick(&self, game: &Game) -> Option<usize> {
        let moves = game.valid_moves();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        moves.choose(&mut *rng).copied()
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for RandomStrategy {
    fn decide(&self, snapshot: Snapshot) -> usize {
        // Only asked while the game is in progress, so a column always exists.
        // Column 0 on a full board is rejected by the engine anyway.
        self.pick(&snapshot).unwrap_or(0)
    }
}

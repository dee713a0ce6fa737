//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a game produces identical results
//! given identical configuration and decisions.
//!
//! # Testing Strategy
//!
//! Replays and logs are only useful if the engine is fully deterministic.
//! Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Game state only uses ordered collections.
//!
//! - **System randomness**: dealing and round-card order come from a seeded
//!   generator in the configuration.
//!
//! - **Decision sources**: the harness builds a fresh source per run, so a
//!   source must itself be a pure function of its construction.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use agricola_core::cards::CardCatalogue;
use agricola_core::config::GameConfig;
use agricola_core::engine::{DecisionSource, Game, TurnOutcome};
use agricola_core::game::GameState;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// Turns played in the first run.
    pub turns: usize,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the game was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Turns: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Play `game` to the end (or until the source gives up) and return the
/// number of turns played.
///
/// # Panics
///
/// Panics on an engine fault.
pub fn play_out(game: &mut Game, source: &mut dyn DecisionSource) -> usize {
    let mut turns = 0;
    loop {
        match game.play_turn(source).expect("no engine fault") {
            TurnOutcome::GameOver | TurnOutcome::Abandoned => return turns,
            TurnOutcome::Committed { .. } | TurnOutcome::RolledBack { .. } => turns += 1,
        }
    }
}

/// Play `runs` full games from `config`, each with a fresh source, and
/// compare final state hashes.
///
/// # Panics
///
/// Panics if the configuration is invalid or the engine faults.
///
/// # Example
///
/// ```ignore
/// use agricola_test_utils::determinism::verify_game_determinism;
/// use agricola_test_utils::sources::CyclingSource;
///
/// let result = verify_game_determinism(&config, 3, || CyclingSource::new(7));
/// result.assert_deterministic();
/// ```
pub fn verify_game_determinism<S, F>(config: &GameConfig, runs: usize, make_source: F) -> DeterminismResult
where
    S: DecisionSource,
    F: Fn() -> S,
{
    let mut hashes = Vec::with_capacity(runs);
    let mut turns = 0;
    for run in 0..runs {
        let mut game = Game::new(config, CardCatalogue::standard()).expect("valid config");
        let mut source = make_source();
        let played = play_out(&mut game, &mut source);
        if run == 0 {
            turns = played;
        }
        tracing::debug!(run, played, hash = game.state().state_hash(), "determinism run finished");
        hashes.push(game.state().state_hash());
    }

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        turns,
    }
}

/// Like [`verify_game_determinism`] but runs every game on its own scoped
/// thread.
///
/// # Panics
///
/// Panics if a game thread panics.
pub fn verify_parallel_determinism<S, F>(config: &GameConfig, runs: usize, make_source: F) -> DeterminismResult
where
    S: DecisionSource,
    F: Fn() -> S + Sync,
{
    let results: Vec<(u64, usize)> = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                s.spawn(|| {
                    let mut game =
                        Game::new(config, CardCatalogue::standard()).expect("valid config");
                    let mut source = make_source();
                    let played = play_out(&mut game, &mut source);
                    (game.state().state_hash(), played)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("game thread panicked"))
            .collect()
    });

    let hashes: Vec<u64> = results.iter().map(|(hash, _)| *hash).collect();
    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        turns: results.first().map_or(0, |(_, turns)| *turns),
    }
}

/// Play two games side by side, returning the first turn after which their
/// states differ.
///
/// # Panics
///
/// Panics if the configuration is invalid or the engine faults.
pub fn find_first_divergence<S, F>(config: &GameConfig, make_source: F) -> Option<usize>
where
    S: DecisionSource,
    F: Fn() -> S,
{
    let mut first = Game::new(config, CardCatalogue::standard()).expect("valid config");
    let mut second = Game::new(config, CardCatalogue::standard()).expect("valid config");
    let mut source_a = make_source();
    let mut source_b = make_source();

    if first.state().state_hash() != second.state().state_hash() {
        return Some(0);
    }

    let mut turn = 0;
    while !first.is_finished() {
        turn += 1;
        let a = first.play_turn(&mut source_a).expect("no engine fault");
        let b = second.play_turn(&mut source_b).expect("no engine fault");
        if a != b || first.state().state_hash() != second.state().state_hash() {
            return Some(turn);
        }
        if a == TurnOutcome::Abandoned {
            break;
        }
    }
    None
}

/// Verify that a serialization round-trip preserves the state exactly.
#[must_use]
pub fn verify_serialization_roundtrip(state: &GameState) -> bool {
    let Ok(bytes) = state.serialize() else {
        return false;
    };
    match GameState::deserialize(&bytes) {
        Ok(restored) => restored == *state && restored.state_hash() == state.state_hash(),
        Err(_) => false,
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{config, started_game};
    use crate::sources::CyclingSource;

    #[test]
    fn test_first_candidate_games_are_deterministic() {
        let result = verify_game_determinism(&config(2, 5), 2, CyclingSource::first);
        result.assert_deterministic();
        assert!(result.turns > 0);
    }

    #[test]
    fn test_parallel_games_match() {
        let result = verify_parallel_determinism(&config(3, 9), 3, || CyclingSource::new(3));
        result.assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(&config(2, 1), || CyclingSource::new(5)), None);
    }

    #[test]
    fn test_started_game_survives_roundtrip() {
        assert!(verify_serialization_roundtrip(started_game(4, 2).state()));
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&(1u8, "a")), compute_hash(&(1u8, "a")));
    }
}

//! Test fixtures and helpers.
//!
//! Pre-built configurations, games and players for consistent testing.

use agricola_core::board::{Board, Space};
use agricola_core::cards::CardCatalogue;
use agricola_core::config::GameConfig;
use agricola_core::engine::Game;
use agricola_core::player::Player;
use agricola_core::resources::{Resource, ResourceMap};

/// Starting rooms of the standard farm.
pub const STARTING_ROOMS: [Space; 2] = [Space::new(0, 0), Space::new(1, 0)];

/// Standard configuration for `players` seats and `seed`.
#[must_use]
pub fn config(players: usize, seed: u64) -> GameConfig {
    GameConfig::default()
        .with_players(players)
        .with_seed(seed)
        .with_game_id(format!("test-{players}p-{seed}"))
}

/// A freshly dealt game with the standard catalogue.
///
/// # Panics
///
/// Panics if the configuration is invalid.
#[must_use]
pub fn new_game(players: usize, seed: u64) -> Game {
    Game::new(&config(players, seed), CardCatalogue::standard()).expect("valid test config")
}

/// A game with its first round already started.
///
/// # Panics
///
/// Panics if the configuration is invalid.
#[must_use]
pub fn started_game(players: usize, seed: u64) -> Game {
    let mut game = new_game(players, seed);
    game.start_round().expect("first round starts");
    game
}

/// The 3x5 starting farm with two wooden rooms.
#[must_use]
pub fn standard_board() -> Board {
    Board::starting(3, 5, &STARTING_ROOMS)
}

/// Build a resource map from pairs.
#[must_use]
pub fn goods(entries: &[(Resource, i32)]) -> ResourceMap {
    entries
        .iter()
        .fold(ResourceMap::new(), |map, &(resource, amount)| {
            map.with(resource, amount)
        })
}

/// Seat 0 on the standard farm with two people plus `extra`.
#[must_use]
pub fn player_with(extra: &[(Resource, i32)]) -> Player {
    let initial = goods(extra)
        .plus(&ResourceMap::of(Resource::People, 2))
        .with(Resource::FencesAvailable, 15)
        .with(Resource::StablesAvailable, 4);
    Player::new(0, initial, standard_board())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_with_adds_supplies() {
        let player = player_with(&[(Resource::Wood, 4)]);
        assert_eq!(player.ledger.get(Resource::Wood), 4);
        assert_eq!(player.people(), 2);
        assert_eq!(player.board.rooms().len(), 2);
    }

    #[test]
    fn test_started_game_is_in_round_one() {
        let game = started_game(3, 1);
        assert_eq!(game.state().round, 1);
        assert_eq!(game.state().players.len(), 3);
    }
}

//! Game configuration.
//!
//! Every field has a default matching the standard card game, so a RON file
//! only needs to list what it changes:
//!
//! ```ron
//! (players: 3, seed: 7)
//! ```

use serde::{Deserialize, Serialize};

use crate::board::Space;
use crate::error::{GameError, Result};
use crate::resources::{Resource, ResourceMap};

/// Largest supported table.
pub const MAX_PLAYERS: usize = 4;

/// Setup parameters for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Identifier used in logs.
    pub game_id: String,
    /// Number of seats (1-4).
    pub players: usize,
    /// Farmyard shape as `(rows, cols)`.
    pub board_shape: (u8, u8),
    /// Rooms every player starts with.
    pub starting_rooms: Vec<Space>,
    /// Goods and supplies every player starts with. Food is set per seat.
    pub starting_resources: ResourceMap,
    /// Food for the starting player.
    pub first_seat_food: i32,
    /// Food for everyone else.
    pub other_seat_food: i32,
    /// Occupations and minor improvements dealt to each player.
    pub hand_size: usize,
    /// Shuffle round cards within each stage.
    pub shuffle_round_cards: bool,
    /// Seed for dealing and shuffling.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            game_id: "game".to_string(),
            players: 2,
            board_shape: (3, 5),
            starting_rooms: vec![Space::new(0, 0), Space::new(1, 0)],
            starting_resources: ResourceMap::new()
                .with(Resource::FencesAvailable, 15)
                .with(Resource::StablesAvailable, 4)
                .with(Resource::People, 2)
                .with(Resource::PeopleAvailable, 3),
            first_seat_food: 2,
            other_seat_food: 3,
            hand_size: 7,
            shuffle_round_cards: true,
            seed: 0,
        }
    }
}

impl GameConfig {
    /// Builder: set the number of players.
    #[must_use]
    pub fn with_players(mut self, players: usize) -> Self {
        self.players = players;
        self
    }

    /// Builder: set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: set the game identifier.
    #[must_use]
    pub fn with_game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = game_id.into();
        self
    }

    /// Parse a configuration from RON.
    pub fn from_ron(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)
            .map_err(|e| GameError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that a game can be set up from this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.players == 0 || self.players > MAX_PLAYERS {
            return Err(GameError::InvalidConfig(format!(
                "player count must be 1-{MAX_PLAYERS}, got {}",
                self.players
            )));
        }
        let (rows, cols) = self.board_shape;
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidConfig("board must not be empty".into()));
        }
        if self.starting_rooms.is_empty() {
            return Err(GameError::InvalidConfig("players need at least one room".into()));
        }
        if let Some(room) = self
            .starting_rooms
            .iter()
            .find(|room| room.row >= rows || room.col >= cols)
        {
            return Err(GameError::InvalidConfig(format!(
                "starting room {room} is outside the {rows}x{cols} board"
            )));
        }
        if let Some((resource, amount)) = self.starting_resources.iter().find(|(_, n)| *n < 0) {
            return Err(GameError::InvalidConfig(format!(
                "starting {resource} must not be negative, got {amount}"
            )));
        }
        if self.starting_resources.get(Resource::People) < 1 {
            return Err(GameError::InvalidConfig("players need at least one person".into()));
        }
        if self.first_seat_food < 0 || self.other_seat_food < 0 {
            return Err(GameError::InvalidConfig("starting food must not be negative".into()));
        }
        Ok(())
    }

    /// Starting goods for `seat`.
    #[must_use]
    pub fn resources_for(&self, seat: usize) -> ResourceMap {
        let food = if seat == 0 {
            self.first_seat_food
        } else {
            self.other_seat_food
        };
        let mut goods = self.starting_resources.clone();
        goods.set(Resource::Food, food);
        goods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = GameConfig::from_ron("(players: 3, seed: 7)").unwrap();
        assert_eq!(config.players, 3);
        assert_eq!(config.seed, 7);
        assert_eq!(config.board_shape, (3, 5));
        assert_eq!(config.hand_size, 7);
    }

    #[test]
    fn test_rejects_bad_player_count() {
        assert!(matches!(
            GameConfig::default().with_players(5).validate(),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_room_off_board() {
        let config = GameConfig {
            starting_rooms: vec![Space::new(3, 0)],
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_family() {
        let mut config = GameConfig::default();
        config.starting_resources.set(Resource::People, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seat_food() {
        let config = GameConfig::default();
        assert_eq!(config.resources_for(0).get(Resource::Food), 2);
        assert_eq!(config.resources_for(1).get(Resource::Food), 3);
        assert_eq!(config.resources_for(1).get(Resource::FencesAvailable), 15);
    }
}

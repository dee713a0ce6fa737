//! Scenario loading.
//!
//! A scenario names a game configuration and, optionally, the agent
//! commands for each seat. Only the fields that differ from the standard
//! game need to be written:
//!
//! ```ron
//! Scenario(
//!     name: "Four player",
//!     game: (players: 4, seed: 11),
//! )
//! ```

use std::path::Path;

use agricola_core::config::GameConfig;
use agricola_core::error::GameError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The game configuration is not playable.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
}

/// A named game setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Game configuration.
    pub game: GameConfig,
    /// Agent command line per seat. Empty means built-in random agents.
    pub agents: Vec<String>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::standard(2)
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.game.validate()?;
        Ok(scenario)
    }

    /// A built-in scenario by name, or a RON file path.
    ///
    /// Built-in names: `solo`, `two_player`, `three_player`, `four_player`.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match name_or_path {
            "solo" => Ok(Self::standard(1)),
            "two_player" => Ok(Self::standard(2)),
            "three_player" => Ok(Self::standard(3)),
            "four_player" => Ok(Self::standard(4)),
            path => Self::load(path),
        }
    }

    /// The standard card game for `players` seats.
    #[must_use]
    pub fn standard(players: usize) -> Self {
        Self {
            name: format!("Standard {players}P"),
            description: format!("Card game with {players} players and the default setup"),
            game: GameConfig::default()
                .with_players(players)
                .with_game_id(format!("standard-{players}p")),
            agents: Vec::new(),
        }
    }

    /// Builder: override the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.game.seed = seed;
        self
    }

    /// Builder: override the player count.
    #[must_use]
    pub fn with_players(mut self, players: usize) -> Self {
        self.game.players = players;
        self
    }

    /// The game configuration, checked.
    pub fn config(&self) -> Result<GameConfig, ScenarioError> {
        self.game.validate()?;
        Ok(self.game.clone())
    }
}

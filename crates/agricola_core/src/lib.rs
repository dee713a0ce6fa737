//! # Agricola Core
//!
//! Deterministic turn-resolution engine for the Agricola worker-placement
//! board game.
//!
//! This crate contains **only** deterministic logic:
//! - No process IO
//! - No system randomness
//! - No wall clock
//!
//! Decisions come from a [`engine::DecisionSource`]; the headless runner
//! wires those to external agents.
//!
//! ## Crate Structure
//!
//! - [`resources`] - Resource ledger with atomic transactions
//! - [`board`] - Farmyard placement, connectivity and fences
//! - [`husbandry`] - Animal capacity packing
//! - [`events`] - Card listeners and firing sites
//! - [`cards`] - Card catalogue and built-in cards
//! - [`step`] - Turn instruction set
//! - [`engine`] - Step engine, round loop and harvest
//! - [`game`] - Game state aggregate
//! - [`snapshot`] - Observations for decision sources

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actions;
pub mod board;
pub mod cards;
pub mod choice;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod game;
pub mod husbandry;
pub mod player;
pub mod resources;
pub mod rng;
pub mod score;
pub mod snapshot;
pub mod step;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actions::{ActionKind, ActionSpace};
    pub use crate::board::{Board, Crop, HouseMaterial, Occupant, OccupantKind, Space};
    pub use crate::cards::{CardCatalogue, CardDef, CardId, CardKind};
    pub use crate::choice::{Candidate, Choice, ChoiceKind, Decision, ResourceCandidate};
    pub use crate::config::GameConfig;
    pub use crate::engine::{DecisionSource, Game, GameOutcome, StepEngine, TurnOutcome};
    pub use crate::error::{EngineFault, GameError, PlacementError, Result, RuleError};
    pub use crate::events::{EventRegistry, GameEvent};
    pub use crate::game::{GameState, GameStatus};
    pub use crate::player::Player;
    pub use crate::resources::{Ledger, Resource, ResourceMap};
    pub use crate::score::ScoreCard;
    pub use crate::snapshot::Observation;
    pub use crate::step::Step;
}

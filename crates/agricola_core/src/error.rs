//! Error types for turn resolution.
//!
//! Two families matter to the engine:
//!
//! - [`RuleError`]: a player attempted something the rules forbid. These are
//!   recoverable. The attempt is rolled back and the player loses an action.
//! - [`EngineFault`]: an invariant of the engine or of a card plug-in was
//!   broken. These halt the run.

use thiserror::Error;

use crate::actions::ActionKind;
use crate::board::{OccupantKind, Space};
use crate::cards::CardId;
use crate::events::GameEvent;
use crate::resources::Resource;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// A recoverable rule violation.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// An unrecoverable engine or plug-in defect.
    #[error("Engine fault: {0}")]
    Fault(#[from] EngineFault),

    /// Configuration could not be used to set up a game.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid game state (serialization and snapshot failures).
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

impl GameError {
    /// The rule violation carried by this error, if it is recoverable.
    #[must_use]
    pub fn as_rule(&self) -> Option<&RuleError> {
        match self {
            Self::Rule(rule) => Some(rule),
            _ => None,
        }
    }
}

impl From<PlacementError> for GameError {
    fn from(err: PlacementError) -> Self {
        Self::Rule(RuleError::IllegalPlacement(err))
    }
}

/// Recoverable rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// A cost or prerequisite was not met.
    #[error("Insufficient resources: need {required} {resource}, have {available}")]
    InsufficientResources {
        /// Resource that fell short.
        resource: Resource,
        /// Amount required.
        required: i32,
        /// Amount available.
        available: i32,
    },

    /// A board invariant would be violated.
    #[error("Illegal placement: {0}")]
    IllegalPlacement(#[from] PlacementError),

    /// The external decision did not match the pending choice.
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),

    /// The action's own precondition is unmet.
    #[error("Impossible action: {0}")]
    ImpossibleAction(String),
}

/// Board invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// A space lies outside the board.
    #[error("space {space} is outside the {rows}x{cols} board")]
    OutOfBounds {
        /// Offending space.
        space: Space,
        /// Board rows.
        rows: u8,
        /// Board columns.
        cols: u8,
    },

    /// A space is already claimed by an incompatible occupant.
    #[error("space {space} is already occupied by a {existing}")]
    Overlap {
        /// Contested space.
        space: Space,
        /// Occupant already holding the space.
        existing: OccupantKind,
    },

    /// The occupant group would not form one connected region.
    #[error("{kind} spaces must form one connected region")]
    Disconnected {
        /// Kind of the disconnected group.
        kind: OccupantKind,
    },

    /// An occupant was given no spaces.
    #[error("a {kind} needs at least one space")]
    Empty {
        /// Kind of the empty occupant.
        kind: OccupantKind,
    },

    /// The space holds no field that can take a crop.
    #[error("space {0} has no empty field to sow")]
    NoEmptyField(Space),

    /// More crops were requested than there are empty fields.
    #[error("cannot sow {requested} fields, only {available} are empty")]
    NotEnoughFields {
        /// Fields requested.
        requested: usize,
        /// Empty fields on the board.
        available: usize,
    },

    /// The farm cannot house the requested animals.
    #[error("not enough room for {sheep} sheep, {boar} boar and {cattle} cattle")]
    OverCapacity {
        /// Requested sheep.
        sheep: i32,
        /// Requested boar.
        boar: i32,
        /// Requested cattle.
        cattle: i32,
    },
}

/// Unrecoverable invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineFault {
    /// A card identifier is missing from the catalogue.
    #[error("unknown card '{0}'")]
    UnknownCard(CardId),

    /// A player index is out of range.
    #[error("unknown player index {0}")]
    UnknownPlayer(usize),

    /// A listener was registered for an event its card does not declare.
    #[error("card '{card}' does not listen to {event}")]
    UndeclaredEvent {
        /// Card being registered or fired.
        card: CardId,
        /// Event it was bound to.
        event: GameEvent,
    },

    /// A listener has no trigger to run.
    #[error("card '{0}' is registered as a listener but has no trigger")]
    MissingTrigger(CardId),

    /// A listener returned an effect the firing site cannot consume.
    #[error("card '{card}' returned a {effect} effect while handling {event}")]
    UnexpectedEffect {
        /// Listener card.
        card: CardId,
        /// Event being handled.
        event: GameEvent,
        /// Effect variant name.
        effect: &'static str,
    },

    /// A step was handed a resolution it does not know how to apply.
    #[error("step {step} cannot apply {candidate}")]
    CandidateMismatch {
        /// Step name.
        step: &'static str,
        /// Debug rendering of the candidate.
        candidate: String,
    },

    /// A step needed a resolved choice but received none.
    #[error("step {0} requires a resolved choice")]
    MissingChoice(&'static str),

    /// An action space is missing from the board.
    #[error("action space {0} is not on the board")]
    UnknownActionSpace(ActionKind),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_message_names_resource() {
        let err = RuleError::InsufficientResources {
            resource: Resource::Wood,
            required: 5,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient resources: need 5 wood, have 2"
        );
    }

    #[test]
    fn test_placement_converts_to_rule() {
        let err: GameError = PlacementError::Disconnected {
            kind: OccupantKind::Room,
        }
        .into();
        assert!(matches!(
            err.as_rule(),
            Some(RuleError::IllegalPlacement(_))
        ));
    }

    #[test]
    fn test_fault_is_not_rule() {
        let err: GameError = EngineFault::UnknownPlayer(9).into();
        assert!(err.as_rule().is_none());
    }
}

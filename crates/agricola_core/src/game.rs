//! Shared game state.
//!
//! [`GameState`] is a single owned aggregate: every player, the action
//! board and the listener registry. A turn attempt runs on a clone and is
//! swapped in only when it succeeds.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::actions::{round_cards, ActionKind, ActionSpace};
use crate::cards::{CardCatalogue, CardId, CardKind, PlayContext};
use crate::error::{EngineFault, GameError, Result, RuleError};
use crate::events::{fire_direct, EventRegistry, Listener, Site};
use crate::player::Player;
use crate::resources::{Resource, ResourceMap};
use crate::step::Step;

// ============================================================================
// Round schedule
// ============================================================================

/// Last round of each stage.
fn stage_ends() -> Vec<u8> {
    let mut end = 0u8;
    round_cards()
        .iter()
        .map(|stage| {
            end += stage.len() as u8;
            end
        })
        .collect()
}

/// Number of rounds in a game.
#[must_use]
pub fn total_rounds() -> u8 {
    stage_ends().last().copied().unwrap_or(0)
}

/// Stage (1-based) that `round` belongs to. Round 0 is before the game.
#[must_use]
pub fn stage_of(round: u8) -> u8 {
    if round == 0 {
        return 0;
    }
    stage_ends()
        .iter()
        .position(|end| round <= *end)
        .map_or(0, |index| index as u8 + 1)
}

/// Whether a harvest follows `round`.
#[must_use]
pub fn is_stage_end(round: u8) -> bool {
    stage_ends().contains(&round)
}

/// Whether `round` opens a stage.
#[must_use]
pub fn is_stage_start(round: u8) -> bool {
    round == 1 || (round > 1 && is_stage_end(round - 1))
}

// ============================================================================
// State
// ============================================================================

/// Where the game is between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Waiting for the next round to start.
    BeforeRound,
    /// Players are placing workers.
    InRound,
    /// The last round is over.
    Finished,
}

/// Everything that changes during a game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    /// Identifier used in logs.
    pub game_id: String,
    /// Current round (1-based; 0 before the first).
    pub round: u8,
    /// Seats in order.
    pub players: Vec<Player>,
    /// Holder of the first-player marker.
    pub first_player: usize,
    /// Seat whose turn it is.
    pub current_player: usize,
    /// Action spaces on the board, in reveal order.
    pub action_spaces: Vec<ActionSpace>,
    /// Round cards still face down, in reveal order.
    pub upcoming: Vec<ActionKind>,
    /// Major improvements nobody has bought yet.
    pub remaining_majors: Vec<CardId>,
    /// Listener bindings of played cards.
    pub registry: EventRegistry,
    /// Phase between turns.
    pub status: GameStatus,
}

impl GameState {
    /// Player at `seat`.
    pub fn player(&self, seat: usize) -> std::result::Result<&Player, EngineFault> {
        self.players.get(seat).ok_or(EngineFault::UnknownPlayer(seat))
    }

    /// Mutable player at `seat`.
    pub fn player_mut(&mut self, seat: usize) -> std::result::Result<&mut Player, EngineFault> {
        self.players
            .get_mut(seat)
            .ok_or(EngineFault::UnknownPlayer(seat))
    }

    /// The revealed action space of `kind`.
    pub fn space(&self, kind: ActionKind) -> std::result::Result<&ActionSpace, EngineFault> {
        self.action_spaces
            .iter()
            .find(|space| space.kind == kind)
            .ok_or(EngineFault::UnknownActionSpace(kind))
    }

    /// Mutable action space of `kind`.
    pub fn space_mut(
        &mut self,
        kind: ActionKind,
    ) -> std::result::Result<&mut ActionSpace, EngineFault> {
        self.action_spaces
            .iter_mut()
            .find(|space| space.kind == kind)
            .ok_or(EngineFault::UnknownActionSpace(kind))
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> u8 {
        stage_of(self.round)
    }

    /// Seats in turn order, starting with the first player.
    #[must_use]
    pub fn seat_order(&self) -> Vec<usize> {
        let n = self.players.len();
        (0..n).map(|k| (self.first_player + k) % n).collect()
    }

    /// Calculate a hash of the full state.
    ///
    /// Two games fed the same configuration and decisions produce identical
    /// hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the state to bytes.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize game state: {}", e)))
    }

    /// Deserialize state from bytes.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| {
            GameError::InvalidState(format!("Failed to deserialize game state: {}", e))
        })
    }

    // ------------------------------------------------------------------------
    // Cards
    // ------------------------------------------------------------------------

    /// Check that `seat` could play `id` now, paying `extra` on top of the
    /// card's cost. Food shortfalls are allowed; they become begging.
    pub fn playable(
        &self,
        catalogue: &CardCatalogue,
        seat: usize,
        id: &CardId,
        extra: &ResourceMap,
    ) -> Result<()> {
        let def = catalogue.get(id)?;
        let player = self.player(seat)?;
        let available = match def.kind {
            CardKind::Occupation => player.hand_occupations.contains(id),
            CardKind::MinorImprovement => player.hand_minors.contains(id),
            CardKind::MajorImprovement => self.remaining_majors.contains(id),
        };
        if !available {
            return Err(
                RuleError::InvalidChoice(format!("{id} is not available to player {seat}")).into(),
            );
        }
        if player.played_occupations.len() < def.min_occupations {
            return Err(RuleError::ImpossibleAction(format!(
                "{id} needs {} occupations, player {seat} has {}",
                def.min_occupations,
                player.played_occupations.len()
            ))
            .into());
        }
        let mut hard = def.cost.plus(extra);
        hard.set(Resource::Food, 0);
        if let Some((resource, required)) = hard
            .iter()
            .find(|(resource, amount)| player.ledger.get(*resource) < *amount)
        {
            return Err(RuleError::InsufficientResources {
                resource,
                required,
                available: player.ledger.get(resource),
            }
            .into());
        }
        Ok(())
    }

    /// Play `id` for `seat`: pay, move it to the played pile, run its
    /// on-play hook, bind its listeners and fire the matching played event.
    ///
    /// Returns follow-up steps in push order.
    pub fn play_card(
        &mut self,
        catalogue: &CardCatalogue,
        seat: usize,
        id: &CardId,
        extra: &ResourceMap,
    ) -> Result<Vec<Step>> {
        self.playable(catalogue, seat, id, extra)?;
        let def = catalogue.get(id)?;
        let ctx = PlayContext {
            round: self.round,
            players: self.players.len(),
        };
        if def.kind == CardKind::MajorImprovement {
            self.remaining_majors.retain(|major| major != id);
        }

        let player = self.player_mut(seat)?;
        player.ledger.pay(&def.cost.plus(extra))?;
        match def.kind {
            CardKind::Occupation => {
                player.hand_occupations.retain(|card| card != id);
                player.played_occupations.push(id.clone());
            }
            CardKind::MinorImprovement => {
                player.hand_minors.retain(|card| card != id);
                player.played_minors.push(id.clone());
            }
            CardKind::MajorImprovement => player.played_majors.push(id.clone()),
        }
        let steps = match def.on_play {
            Some(hook) => hook(player, &ctx)?,
            None => Vec::new(),
        };
        tracing::info!(player = seat, card = %id, kind = ?def.kind, "card played");

        for event in &def.events {
            let listener = Listener {
                owner: seat,
                card: id.clone(),
            };
            self.registry.register(listener, *event, catalogue)?;
        }
        let mut fired = fire_direct(self, catalogue, def.kind.played_event(), seat, Site::Turn)?;
        fired.extend(steps);
        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule() {
        assert_eq!(total_rounds(), 14);
        assert_eq!(stage_of(0), 0);
        assert_eq!(stage_of(1), 1);
        assert_eq!(stage_of(4), 1);
        assert_eq!(stage_of(5), 2);
        assert_eq!(stage_of(14), 6);
        let harvests: Vec<u8> = (1..=14).filter(|r| is_stage_end(*r)).collect();
        assert_eq!(harvests, vec![4, 7, 9, 11, 13, 14]);
        assert!(is_stage_start(1));
        assert!(is_stage_start(5));
        assert!(!is_stage_start(6));
    }
}

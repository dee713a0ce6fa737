//! Read-only views handed to decision sources.
//!
//! An [`Observation`] is built fresh for every externalized choice. It is
//! plain data: serializing it never touches the live state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actions::ActionKind;
use crate::board::{CellView, Fence, HouseMaterial, Space};
use crate::cards::{CardCatalogue, CardId};
use crate::choice::{CandidateView, Choice, FreeForm};
use crate::error::Result;
use crate::game::GameState;
use crate::player::Player;
use crate::resources::ResourceMap;
use crate::score::score_player;

/// One action space as seen by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpaceView {
    /// Space identifier.
    pub action: ActionKind,
    /// Goods waiting on it.
    pub stock: ResourceMap,
    /// Whether a worker can still go here.
    pub is_available: bool,
    /// Seat that took it this round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_by: Option<usize>,
}

/// One player as seen by the observer. Hands of other players are reduced
/// to counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Seat index.
    pub id: usize,
    /// Resource counters.
    pub resources: ResourceMap,
    /// Begging tokens.
    pub begging: u32,
    /// House material.
    pub house: HouseMaterial,
    /// Every board space with its contents.
    pub cells: Vec<CellView>,
    /// Pasture groups.
    pub pastures: Vec<Vec<Space>>,
    /// Fence segments on the board.
    pub fences: Vec<Fence>,
    /// Occupations in hand; only present for the observer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_occupations: Option<Vec<CardId>>,
    /// Minor improvements in hand; only present for the observer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_minors: Option<Vec<CardId>>,
    /// Cards in hand.
    pub hand_size: usize,
    /// Occupations played.
    pub played_occupations: Vec<CardId>,
    /// Minor improvements played.
    pub played_minors: Vec<CardId>,
    /// Major improvements bought.
    pub played_majors: Vec<CardId>,
    /// Workers left this round.
    pub actions_remaining: u8,
    /// Goods scheduled for future rounds.
    pub futures: BTreeMap<u8, ResourceMap>,
    /// Score if the game ended now.
    pub score: i32,
}

impl PlayerView {
    fn capture(player: &Player, catalogue: &CardCatalogue, observer: usize) -> Result<Self> {
        let own = player.id == observer;
        Ok(Self {
            id: player.id,
            resources: player.ledger.counts().clone(),
            begging: player.ledger.begging(),
            house: player.board.house.material,
            cells: player.board.cells(),
            pastures: player
                .board
                .pastures()
                .iter()
                .map(|pasture| pasture.spaces().iter().copied().collect())
                .collect(),
            fences: player.board.fences().into_iter().collect(),
            hand_occupations: own.then(|| player.hand_occupations.clone()),
            hand_minors: own.then(|| player.hand_minors.clone()),
            hand_size: player.hand_occupations.len() + player.hand_minors.len(),
            played_occupations: player.played_occupations.clone(),
            played_minors: player.played_minors.clone(),
            played_majors: player.played_majors.clone(),
            actions_remaining: player.actions_remaining,
            futures: player.futures.clone(),
            score: score_player(player, catalogue)?.total,
        })
    }
}

/// Everything a decision source sees when asked to decide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Game identifier.
    pub game_id: String,
    /// Current round.
    pub round: u8,
    /// Current stage.
    pub stage: u8,
    /// Seat the observation is for.
    pub player: usize,
    /// Seat whose turn it is.
    pub current_player: usize,
    /// Holder of the first-player marker.
    pub first_player: usize,
    /// Revealed action spaces.
    pub action_spaces: Vec<ActionSpaceView>,
    /// Round cards not yet revealed.
    pub upcoming_round_cards: usize,
    /// Major improvements still for sale.
    pub remaining_majors: Vec<CardId>,
    /// All seats in order.
    pub players: Vec<PlayerView>,
    /// Kind of the pending choice, such as `take_resources:Forest`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_event: Option<String>,
    /// Prompt of the pending choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Listed candidates of the pending choice.
    pub choice_candidates: Vec<CandidateView>,
    /// Unlisted decisions the pending choice also accepts.
    pub free_form: FreeForm,
    /// Whether this player's last attempt was rolled back.
    pub is_previous_action_failed: bool,
    /// Why it was rolled back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_error: Option<String>,
}

impl Observation {
    /// Capture the state from `player`'s seat, with `choice` pending.
    pub fn capture(
        state: &GameState,
        catalogue: &CardCatalogue,
        player: usize,
        choice: Option<&Choice>,
    ) -> Result<Self> {
        let previous_error = state.player(player)?.last_error.clone();
        let players = state
            .players
            .iter()
            .map(|seat| PlayerView::capture(seat, catalogue, player))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            game_id: state.game_id.clone(),
            round: state.round,
            stage: state.stage(),
            player,
            current_player: state.current_player,
            first_player: state.first_player,
            action_spaces: state
                .action_spaces
                .iter()
                .map(|space| ActionSpaceView {
                    action: space.kind,
                    stock: space.stock.clone(),
                    is_available: space.is_available(),
                    taken_by: space.taken_by,
                })
                .collect(),
            upcoming_round_cards: state.upcoming.len(),
            remaining_majors: state.remaining_majors.clone(),
            players,
            current_event: choice.map(|c| c.kind.to_string()),
            prompt: choice.map(|c| c.prompt.clone()),
            choice_candidates: choice.map(Choice::summarize).unwrap_or_default(),
            free_form: choice.map(Choice::free_form).unwrap_or_default(),
            is_previous_action_failed: previous_error.is_some(),
            previous_error,
        })
    }

    /// The observer's own view.
    #[must_use]
    pub fn me(&self) -> Option<&PlayerView> {
        self.players.get(self.player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::{Candidate, ChoiceKind};
    use crate::config::GameConfig;
    use crate::engine::Game;

    fn game() -> Game {
        Game::new(&GameConfig::default(), CardCatalogue::standard()).unwrap()
    }

    #[test]
    fn test_other_hands_are_hidden() {
        let game = game();
        let obs = game.observe(1).unwrap();
        assert!(obs.players[0].hand_occupations.is_none());
        assert_eq!(obs.players[0].hand_size, 10);
        assert_eq!(obs.me().unwrap().hand_occupations.as_ref().unwrap().len(), 7);
    }

    #[test]
    fn test_choice_fields() {
        let game = game();
        let choice = Choice::new(
            ChoiceKind::TakeResources(ActionKind::Forest),
            "Take the goods from Forest",
            vec![Candidate::Decline],
        );
        let obs = Observation::capture(game.state(), game.catalogue(), 0, Some(&choice)).unwrap();
        assert_eq!(obs.current_event.as_deref(), Some("take_resources:Forest"));
        assert_eq!(obs.choice_candidates.len(), 1);
        assert!(!obs.is_previous_action_failed);
    }

    #[test]
    fn test_previous_error_surfaces() {
        let mut game = game();
        game.state_mut().players[0].last_error = Some("Impossible action: nope".into());
        let obs = game.observe(0).unwrap();
        assert!(obs.is_previous_action_failed);
        assert_eq!(obs.previous_error.as_deref(), Some("Impossible action: nope"));
    }

    #[test]
    fn test_serializes_to_json() {
        let obs = game().observe(0).unwrap();
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["round"], 0);
        assert!(json.get("previous_error").is_none());
        assert_eq!(json["players"][0]["cells"].as_array().unwrap().len(), 15);
    }
}

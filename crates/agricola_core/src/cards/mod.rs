//! Ability cards.
//!
//! Cards are data: a [`CardDef`] carries the cost, prerequisites, the events
//! the card listens to and plain function pointers for its behaviour. The
//! [`CardCatalogue`] indexes definitions by [`CardId`]; game state only ever
//! stores identifiers.

mod improvements;
mod occupations;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::choice::ResourceCandidate;
use crate::error::{EngineFault, Result};
use crate::events::{Effect, GameEvent, TriggerContext};
use crate::player::Player;
use crate::resources::{Resource, ResourceMap};
use crate::step::Step;

pub use improvements::{major_improvements, minor_improvements};
pub use occupations::occupations;

/// Card identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl From<&str> for CardId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Card families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// Occupation, played through a lessons space.
    Occupation,
    /// Minor improvement from the player's hand.
    MinorImprovement,
    /// Major improvement from the shared supply.
    MajorImprovement,
}

impl CardKind {
    /// Event fired after a card of this kind is played.
    #[must_use]
    pub const fn played_event(self) -> GameEvent {
        match self {
            Self::Occupation => GameEvent::Occupation,
            Self::MinorImprovement => GameEvent::MinorImprovement,
            Self::MajorImprovement => GameEvent::MajorImprovement,
        }
    }
}

/// Context passed to [`OnPlay`] hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayContext {
    /// Round the card is played in.
    pub round: u8,
    /// Number of players.
    pub players: usize,
}

/// Runs once when the card is played. May mutate the owner and queue steps.
pub type OnPlay = fn(&mut Player, &PlayContext) -> Result<Vec<Step>>;

/// Runs when an event the card listens to fires for its owner.
pub type Trigger = fn(&TriggerContext<'_>) -> Result<Effect>;

/// End-game points that depend on the owner's farm.
pub type BonusPoints = fn(&Player) -> i32;

/// Static definition of a card.
#[derive(Clone)]
pub struct CardDef {
    /// Identifier.
    pub id: CardId,
    /// Family.
    pub kind: CardKind,
    /// Goods paid to play it.
    pub cost: ResourceMap,
    /// Occupations the player must already have.
    pub min_occupations: usize,
    /// Smallest player count the card is dealt in.
    pub min_players: usize,
    /// Events the card may listen to.
    pub events: Vec<GameEvent>,
    /// Hook run when played.
    pub on_play: Option<OnPlay>,
    /// Hook run on listened events.
    pub trigger: Option<Trigger>,
    /// Fixed victory points.
    pub points: i32,
    /// Farm-dependent victory points.
    pub bonus_points: Option<BonusPoints>,
}

impl fmt::Debug for CardDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDef")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("cost", &self.cost)
            .field("min_occupations", &self.min_occupations)
            .field("min_players", &self.min_players)
            .field("events", &self.events)
            .field("on_play", &self.on_play.is_some())
            .field("trigger", &self.trigger.is_some())
            .field("points", &self.points)
            .finish()
    }
}

impl CardDef {
    /// Bare card with no cost and no behaviour.
    #[must_use]
    pub fn new(id: &str, kind: CardKind) -> Self {
        Self {
            id: CardId::from(id),
            kind,
            cost: ResourceMap::new(),
            min_occupations: 0,
            min_players: 1,
            events: Vec::new(),
            on_play: None,
            trigger: None,
            points: 0,
            bonus_points: None,
        }
    }

    /// Builder: add a cost entry.
    #[must_use]
    pub fn costing(mut self, resource: Resource, amount: i32) -> Self {
        self.cost.add(resource, amount);
        self
    }

    /// Builder: require this many played occupations.
    #[must_use]
    pub fn requires_occupations(mut self, n: usize) -> Self {
        self.min_occupations = n;
        self
    }

    /// Builder: only deal this card with at least `n` players.
    #[must_use]
    pub fn min_players(mut self, n: usize) -> Self {
        self.min_players = n;
        self
    }

    /// Builder: events to listen to.
    #[must_use]
    pub fn listens(mut self, events: &[GameEvent]) -> Self {
        self.events.extend_from_slice(events);
        self
    }

    /// Builder: on-play hook.
    #[must_use]
    pub fn with_on_play(mut self, hook: OnPlay) -> Self {
        self.on_play = Some(hook);
        self
    }

    /// Builder: event trigger.
    #[must_use]
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Builder: fixed victory points.
    #[must_use]
    pub fn worth(mut self, points: i32) -> Self {
        self.points = points;
        self
    }

    /// Builder: farm-dependent victory points.
    #[must_use]
    pub fn with_bonus_points(mut self, bonus: BonusPoints) -> Self {
        self.bonus_points = Some(bonus);
        self
    }

    /// Total victory points for `owner`.
    #[must_use]
    pub fn victory_points(&self, owner: &Player) -> i32 {
        self.points + self.bonus_points.map_or(0, |bonus| bonus(owner))
    }
}

/// All known cards, keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct CardCatalogue {
    cards: BTreeMap<CardId, CardDef>,
    order: Vec<CardId>,
}

impl CardCatalogue {
    /// Empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue with every built-in card.
    #[must_use]
    pub fn standard() -> Self {
        let mut catalogue = Self::new();
        for def in occupations()
            .into_iter()
            .chain(minor_improvements())
            .chain(major_improvements())
        {
            catalogue.register(def);
        }
        catalogue
    }

    /// Add or replace a definition.
    pub fn register(&mut self, def: CardDef) {
        if !self.cards.contains_key(&def.id) {
            self.order.push(def.id.clone());
        }
        self.cards.insert(def.id.clone(), def);
    }

    /// Definition for `id`.
    pub fn get(&self, id: &CardId) -> std::result::Result<&CardDef, EngineFault> {
        self.cards
            .get(id)
            .ok_or_else(|| EngineFault::UnknownCard(id.clone()))
    }

    /// Cards of `kind` dealt at `players`, in registration order.
    #[must_use]
    pub fn of_kind(&self, kind: CardKind, players: usize) -> Vec<CardId> {
        self.order
            .iter()
            .filter_map(|id| self.cards.get(id))
            .filter(|def| def.kind == kind && def.min_players <= players)
            .map(|def| def.id.clone())
            .collect()
    }

    /// Number of cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the catalogue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

// ============================================================================
// Shared card helpers
// ============================================================================

/// Schedule `goods` at each of `rounds` after the current one.
pub(crate) fn schedule_relative(player: &mut Player, now: u8, rounds: &[u8], goods: &ResourceMap) {
    for offset in rounds {
        player.add_future(now.saturating_add(*offset), goods);
    }
}

/// Schedule `goods` at each absolute round in `rounds` that is still ahead.
pub(crate) fn schedule_absolute(player: &mut Player, now: u8, rounds: &[u8], goods: &ResourceMap) {
    for round in rounds.iter().filter(|round| **round > now) {
        player.add_future(*round, goods);
    }
}

/// Append one variant per affordable exchange, derived from every input that
/// no card has touched and that pays nothing. Inputs are kept unchanged.
pub(crate) fn exchange_variants(
    ctx: &TriggerContext<'_>,
    candidates: Vec<ResourceCandidate>,
    card: &str,
    exchanges: &[(ResourceMap, ResourceMap)],
) -> Vec<ResourceCandidate> {
    let mut out = candidates.clone();
    for candidate in candidates
        .iter()
        .filter(|c| c.sources.is_empty() && c.paid.is_empty())
    {
        for (pay, gain) in exchanges {
            let variant = candidate
                .clone()
                .paying(pay)
                .gaining(gain)
                .from_card(card);
            if variant.is_affordable(ctx.player.ledger.counts()) {
                out.push(variant);
            }
        }
    }
    out
}

/// Add `bonus` to every candidate whose taken goods include `when`.
pub(crate) fn bonus_when_taken(
    candidates: Vec<ResourceCandidate>,
    when: Resource,
    card: &str,
    bonus: &ResourceMap,
) -> Vec<ResourceCandidate> {
    candidates
        .into_iter()
        .map(|candidate| {
            if candidate.taken.get(when) > 0 {
                candidate.gaining(bonus).from_card(card)
            } else {
                candidate
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalogue_is_consistent() {
        let catalogue = CardCatalogue::standard();
        assert!(!catalogue.is_empty());
        for id in catalogue.order.iter() {
            let def = catalogue.get(id).unwrap();
            if !def.events.is_empty() {
                assert!(def.trigger.is_some(), "{id} listens without a trigger");
            }
        }
    }

    #[test]
    fn test_min_players_filters_deal() {
        let catalogue = CardCatalogue::standard();
        let two = catalogue.of_kind(CardKind::Occupation, 2);
        let four = catalogue.of_kind(CardKind::Occupation, 4);
        assert!(four.len() > two.len());
        assert!(!two.contains(&CardId::from("Conjurer")));
    }

    #[test]
    fn test_unknown_card_is_fault() {
        let catalogue = CardCatalogue::standard();
        assert_eq!(
            catalogue.get(&CardId::from("Nobody")).unwrap_err(),
            EngineFault::UnknownCard(CardId::from("Nobody"))
        );
    }
}

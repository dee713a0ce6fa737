//! Event registry.
//!
//! Played cards listen to [`GameEvent`]s. When an event fires for a player,
//! each of that player's listeners runs its trigger, in the order the cards
//! were played, and hands back an [`Effect`]. The firing site decides which
//! effects it can consume:
//!
//! - direct sites (round boundaries, construction, harvest phases) apply
//!   grants and, inside a turn, queue extra steps;
//! - candidate sites (taking goods, trading, baking) thread the candidate
//!   list through every rewrite, left to right.
//!
//! An effect the site cannot consume is an [`EngineFault`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actions::ActionKind;
use crate::cards::{CardCatalogue, CardId};
use crate::choice::ResourceCandidate;
use crate::error::{EngineFault, Result};
use crate::game::GameState;
use crate::player::Player;
use crate::resources::ResourceMap;
use crate::step::Step;

// ============================================================================
// Events
// ============================================================================

/// Named points in the game that cards can hook into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEvent {
    /// A round begins.
    StartRound,
    /// The first round of a stage begins.
    StartStage,
    /// A round ends.
    EndRound,
    /// A stage ends, after its harvest.
    EndStage,
    /// Harvest: crops come in.
    FieldPhase,
    /// Harvest: the family eats.
    FeedingPhase,
    /// Harvest: animals breed.
    BreedingPhase,
    /// The house was renovated.
    Renovation,
    /// A room was built.
    BuildRoom,
    /// Pastures were fenced.
    BuildPasture,
    /// A stable was built.
    BuildStable,
    /// A field was plowed.
    PlowField,
    /// Fields were sown.
    Sow,
    /// A child was born.
    Birth,
    /// An occupation was played.
    Occupation,
    /// A minor improvement was played.
    MinorImprovement,
    /// A major improvement was bought.
    MajorImprovement,
    /// The player may convert goods.
    ResourceTrading,
    /// The player bakes bread.
    Baking,
    /// An action space was used.
    Action(ActionKind),
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Action(action) => return write!(f, "action:{action}"),
            Self::StartRound => "start_round",
            Self::StartStage => "start_stage",
            Self::EndRound => "end_round",
            Self::EndStage => "end_stage",
            Self::FieldPhase => "field_phase",
            Self::FeedingPhase => "feeding_phase",
            Self::BreedingPhase => "breeding_phase",
            Self::Renovation => "renovation",
            Self::BuildRoom => "build_room",
            Self::BuildPasture => "build_pasture",
            Self::BuildStable => "build_stable",
            Self::PlowField => "plow_field",
            Self::Sow => "sow",
            Self::Birth => "birth",
            Self::Occupation => "occupation",
            Self::MinorImprovement => "minor_improvement",
            Self::MajorImprovement => "major_improvement",
            Self::ResourceTrading => "resource_trading",
            Self::Baking => "baking",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Trigger plumbing
// ============================================================================

/// What a trigger sees.
#[derive(Debug, Clone, Copy)]
pub struct TriggerContext<'a> {
    /// Event being handled.
    pub event: GameEvent,
    /// Listener owner, who is also the acting player.
    pub player: &'a Player,
    /// Current round (1-based).
    pub round: u8,
    /// Number of players in the game.
    pub players: usize,
}

/// Rewrites a candidate list. Conventionally re-emits every input.
pub type CandidateFilter =
    fn(&TriggerContext<'_>, Vec<ResourceCandidate>) -> Vec<ResourceCandidate>;

/// Result of one listener's trigger.
#[derive(Clone)]
pub enum Effect {
    /// Nothing happens.
    None,
    /// Goods go straight to the owner.
    Grant(ResourceMap),
    /// Extra steps for the current turn.
    Steps(Vec<Step>),
    /// Rewrite the pending candidate list.
    Rewrite(CandidateFilter),
}

impl Effect {
    /// Variant name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Grant(_) => "grant",
            Self::Steps(_) => "steps",
            Self::Rewrite(_) => "rewrite",
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Grant(map) => f.debug_tuple("Grant").field(map).finish(),
            Self::Steps(steps) => f.debug_tuple("Steps").field(steps).finish(),
            Self::Rewrite(_) => f.write_str("Rewrite(..)"),
        }
    }
}

/// A card bound to an event for its owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Listener {
    /// Owning player.
    pub owner: usize,
    /// Card providing the trigger.
    pub card: CardId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct Binding {
    event: GameEvent,
    listener: Listener,
}

/// One listener's output from [`EventRegistry::fire`].
#[derive(Debug, Clone)]
pub struct Fired {
    /// Card that produced the effect.
    pub card: CardId,
    /// The effect.
    pub effect: Effect,
}

// ============================================================================
// Registry
// ============================================================================

/// Listener bindings in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRegistry {
    bindings: Vec<Binding>,
}

impl EventRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `listener` to `event`. Binding the same pair twice is a no-op.
    ///
    /// The card must declare `event` in the catalogue.
    pub fn register(
        &mut self,
        listener: Listener,
        event: GameEvent,
        catalogue: &CardCatalogue,
    ) -> Result<bool> {
        let def = catalogue.get(&listener.card)?;
        if !def.events.contains(&event) {
            return Err(EngineFault::UndeclaredEvent {
                card: listener.card,
                event,
            }
            .into());
        }
        let binding = Binding { event, listener };
        if self.bindings.contains(&binding) {
            return Ok(false);
        }
        tracing::trace!(%event, card = %binding.listener.card, owner = binding.listener.owner, "listener registered");
        self.bindings.push(binding);
        Ok(true)
    }

    /// Listeners bound to `event`, in registration order.
    pub fn listeners(&self, event: GameEvent) -> impl Iterator<Item = &Listener> {
        self.bindings
            .iter()
            .filter(move |binding| binding.event == event)
            .map(|binding| &binding.listener)
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Run every trigger the context's player has bound to its event.
    ///
    /// A trigger error aborts the whole firing.
    pub fn fire(&self, ctx: &TriggerContext<'_>, catalogue: &CardCatalogue) -> Result<Vec<Fired>> {
        let mut fired = Vec::new();
        for listener in self.listeners(ctx.event) {
            if listener.owner != ctx.player.id {
                continue;
            }
            let def = catalogue.get(&listener.card)?;
            if !def.events.contains(&ctx.event) {
                return Err(EngineFault::UndeclaredEvent {
                    card: listener.card.clone(),
                    event: ctx.event,
                }
                .into());
            }
            let trigger = def
                .trigger
                .ok_or_else(|| EngineFault::MissingTrigger(listener.card.clone()))?;
            let effect = trigger(ctx)?;
            tracing::trace!(event = %ctx.event, card = %listener.card, effect = effect.name(), "trigger fired");
            fired.push(Fired {
                card: listener.card.clone(),
                effect,
            });
        }
        Ok(fired)
    }
}

// ============================================================================
// Firing sites
// ============================================================================

/// Where an event is fired from, which limits the effects it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    /// Inside a turn: grants and steps.
    Turn,
    /// Between turns: grants only.
    Upkeep,
}

/// Fire `event` for `player` and apply direct effects.
///
/// Returns extra steps (always empty for [`Site::Upkeep`]).
pub fn fire_direct(
    state: &mut GameState,
    catalogue: &CardCatalogue,
    event: GameEvent,
    player: usize,
    site: Site,
) -> Result<Vec<Step>> {
    let fired = {
        let owner = state.player(player)?;
        let ctx = TriggerContext {
            event,
            player: owner,
            round: state.round,
            players: state.players.len(),
        };
        state.registry.fire(&ctx, catalogue)?
    };

    // Grants land in one transaction once every effect has been accepted.
    let mut granted = ResourceMap::new();
    let mut steps = Vec::new();
    for Fired { card, effect } in fired {
        match (effect, site) {
            (Effect::None, _) => {}
            (Effect::Grant(goods), _) => granted = granted.plus(&goods),
            (Effect::Steps(extra), Site::Turn) => steps.extend(extra),
            (effect, _) => {
                return Err(EngineFault::UnexpectedEffect {
                    card,
                    event,
                    effect: effect.name(),
                }
                .into())
            }
        }
    }
    if !granted.is_empty() {
        state.player_mut(player)?.ledger.grant(&granted)?;
    }
    Ok(steps)
}

/// Fire `event` for `player` and thread `baseline` through every rewrite.
pub fn fire_filters(
    state: &GameState,
    catalogue: &CardCatalogue,
    event: GameEvent,
    player: usize,
    baseline: Vec<ResourceCandidate>,
) -> Result<Vec<ResourceCandidate>> {
    let ctx = TriggerContext {
        event,
        player: state.player(player)?,
        round: state.round,
        players: state.players.len(),
    };
    let mut candidates = baseline;
    for Fired { card, effect } in state.registry.fire(&ctx, catalogue)? {
        match effect {
            Effect::None => {}
            Effect::Rewrite(filter) => candidates = filter(&ctx, candidates),
            other => {
                return Err(EngineFault::UnexpectedEffect {
                    card,
                    event,
                    effect: other.name(),
                }
                .into())
            }
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDef, CardKind};
    use crate::resources::Resource;

    fn grant_wood(_: &TriggerContext<'_>) -> Result<Effect> {
        Ok(Effect::Grant(ResourceMap::of(Resource::Wood, 1)))
    }

    fn catalogue() -> CardCatalogue {
        let mut catalogue = CardCatalogue::new();
        catalogue.register(
            CardDef::new("Lumberjack", CardKind::Occupation)
                .listens(&[GameEvent::StartRound])
                .with_trigger(grant_wood),
        );
        catalogue
    }

    #[test]
    fn test_event_display() {
        assert_eq!(GameEvent::Action(ActionKind::Forest).to_string(), "action:Forest");
        assert_eq!(GameEvent::StartRound.to_string(), "start_round");
    }

    #[test]
    fn test_register_is_idempotent() {
        let catalogue = catalogue();
        let mut registry = EventRegistry::new();
        let listener = Listener {
            owner: 0,
            card: CardId::from("Lumberjack"),
        };
        assert!(registry
            .register(listener.clone(), GameEvent::StartRound, &catalogue)
            .unwrap());
        assert!(!registry
            .register(listener, GameEvent::StartRound, &catalogue)
            .unwrap());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_undeclared_event_is_fault() {
        let catalogue = catalogue();
        let mut registry = EventRegistry::new();
        let err = registry
            .register(
                Listener {
                    owner: 0,
                    card: CardId::from("Lumberjack"),
                },
                GameEvent::EndRound,
                &catalogue,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::GameError::Fault(EngineFault::UndeclaredEvent { .. })
        ));
    }

    #[test]
    fn test_fire_only_reaches_owner() {
        let catalogue = catalogue();
        let mut registry = EventRegistry::new();
        registry
            .register(
                Listener {
                    owner: 1,
                    card: CardId::from("Lumberjack"),
                },
                GameEvent::StartRound,
                &catalogue,
            )
            .unwrap();
        let player = Player::new(0, ResourceMap::new(), crate::board::Board::new(3, 5));
        let ctx = TriggerContext {
            event: GameEvent::StartRound,
            player: &player,
            round: 1,
            players: 2,
        };
        assert!(registry.fire(&ctx, &catalogue).unwrap().is_empty());
    }

    fn bind(state: &mut GameState, catalogue: &CardCatalogue, card: &str) {
        state
            .registry
            .register(
                Listener {
                    owner: 0,
                    card: CardId::from(card),
                },
                GameEvent::StartRound,
                catalogue,
            )
            .unwrap();
    }

    fn upkeep_state() -> GameState {
        crate::engine::Game::new(
            &crate::config::GameConfig::default(),
            CardCatalogue::standard(),
        )
        .unwrap()
        .state()
        .clone()
    }

    #[test]
    fn test_upkeep_grants_are_applied_together() {
        let mut catalogue = catalogue();
        catalogue.register(
            CardDef::new("Stacker", CardKind::Occupation)
                .listens(&[GameEvent::StartRound])
                .with_trigger(|_| Ok(Effect::Grant(ResourceMap::of(Resource::Wood, 2)))),
        );
        let mut state = upkeep_state();
        bind(&mut state, &catalogue, "Lumberjack");
        bind(&mut state, &catalogue, "Stacker");
        let before = state.players[0].ledger.get(Resource::Wood);

        let steps = fire_direct(&mut state, &catalogue, GameEvent::StartRound, 0, Site::Upkeep)
            .unwrap();
        assert!(steps.is_empty());
        assert_eq!(state.players[0].ledger.get(Resource::Wood), before + 3);
    }

    #[test]
    fn test_rejected_upkeep_effect_keeps_earlier_grants_out() {
        let mut catalogue = catalogue();
        catalogue.register(
            CardDef::new("Meddler", CardKind::Occupation)
                .listens(&[GameEvent::StartRound])
                .with_trigger(|_| Ok(Effect::Steps(vec![Step::Bake]))),
        );
        let mut state = upkeep_state();
        bind(&mut state, &catalogue, "Lumberjack");
        bind(&mut state, &catalogue, "Meddler");
        let before = state.players[0].ledger.clone();

        let err = fire_direct(&mut state, &catalogue, GameEvent::StartRound, 0, Site::Upkeep)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::GameError::Fault(EngineFault::UnexpectedEffect { .. })
        ));
        assert_eq!(state.players[0].ledger, before);
    }
}

//! Step instruction set.
//!
//! A [`Step`] is one unit of pending work on a player's turn stack. Each step
//! may ask for a [`Choice`] and, once applied, returns follow-up steps. The
//! returned list is in push order: the last element resolves first.
//!
//! Repeatable steps ("build another room?") re-push themselves after a
//! successful build. Stable building carries an explicit remaining count so
//! the loop is bounded by the player's stable supply.

use serde::{Deserialize, Serialize};

use crate::actions::ActionKind;
use crate::board::{Occupant, OccupantKind, Space};
use crate::cards::CardCatalogue;
use crate::choice::{Candidate, Choice, ChoiceKind, FreeForm, ResourceCandidate};
use crate::error::{EngineFault, Result, RuleError};
use crate::events::{fire_direct, fire_filters, GameEvent, Site};
use crate::game::GameState;
use crate::player::Player;
use crate::resources::{Resource, ResourceMap};

/// Pending work on a turn stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Place a worker on an action space.
    SelectAction,
    /// Take the goods of an action space.
    TakeResources {
        /// Space being used.
        action: ActionKind,
    },
    /// Plow one field.
    Plow {
        /// Whether the player may skip.
        optional: bool,
    },
    /// Build rooms, one per iteration.
    BuildRooms,
    /// Build stables, one per iteration.
    BuildStables {
        /// Iterations left.
        remaining: u8,
    },
    /// Fence pastures.
    Fence {
        /// Whether the player may skip.
        optional: bool,
    },
    /// Play an occupation from hand.
    PlayOccupation {
        /// Lessons space used, which sets the food cost.
        action: ActionKind,
    },
    /// Play a minor improvement, or buy a major one.
    PlayImprovement {
        /// Whether major improvements are on offer.
        majors: bool,
        /// Whether the player may skip.
        optional: bool,
    },
    /// Renovate the house.
    Renovate,
    /// Sow empty fields.
    Sow {
        /// Whether the player may skip.
        optional: bool,
    },
    /// Bake bread with the player's improvements.
    Bake,
    /// Add a family member.
    FamilyGrowth {
        /// Whether a free room is required.
        needs_room: bool,
    },
    /// Take the first-player marker.
    BecomeFirstPlayer,
    /// Convert goods; repeats until the player declines.
    Trade,
}

/// Reverse a list written in execution order into push order.
fn in_order(mut steps: Vec<Step>) -> Vec<Step> {
    steps.reverse();
    steps
}

impl Step {
    /// Name used in logs and faults.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectAction => "select_action",
            Self::TakeResources { .. } => "take_resources",
            Self::Plow { .. } => "plow",
            Self::BuildRooms => "build_rooms",
            Self::BuildStables { .. } => "build_stables",
            Self::Fence { .. } => "fence",
            Self::PlayOccupation { .. } => "play_occupation",
            Self::PlayImprovement { .. } => "play_improvement",
            Self::Renovate => "renovate",
            Self::Sow { .. } => "sow",
            Self::Bake => "bake",
            Self::FamilyGrowth { .. } => "family_growth",
            Self::BecomeFirstPlayer => "become_first_player",
            Self::Trade => "trade",
        }
    }

    /// Steps an action space expands into, in push order.
    #[must_use]
    pub fn expand(action: ActionKind, player: &Player) -> Vec<Self> {
        use ActionKind::*;
        if action.yields_resources() {
            return vec![Self::TakeResources { action }];
        }
        let steps = match action {
            Farmland => vec![Self::Plow { optional: false }],
            FarmExpansion => vec![
                Self::BuildRooms,
                Self::BuildStables {
                    remaining: player.ledger.get(Resource::StablesAvailable).max(0) as u8,
                },
            ],
            MeetingPlace => vec![
                Self::BecomeFirstPlayer,
                Self::PlayImprovement {
                    majors: false,
                    optional: true,
                },
            ],
            Lessons | SecondLessons => vec![Self::PlayOccupation { action }],
            MajorImprovement => vec![Self::PlayImprovement {
                majors: true,
                optional: false,
            }],
            Fencing => vec![Self::Fence { optional: false }],
            GrainUtilization => vec![Self::Sow { optional: true }, Self::Bake],
            BasicWishForChildren => vec![
                Self::FamilyGrowth { needs_room: true },
                Self::PlayImprovement {
                    majors: false,
                    optional: true,
                },
            ],
            UrgentWishForChildren => vec![Self::FamilyGrowth { needs_room: false }],
            HouseRedevelopment => vec![
                Self::Renovate,
                Self::PlayImprovement {
                    majors: true,
                    optional: true,
                },
            ],
            FarmRedevelopment => vec![Self::Renovate, Self::Fence { optional: true }],
            Cultivation => vec![Self::Plow { optional: true }, Self::Sow { optional: true }],
            _ => Vec::new(),
        };
        in_order(steps)
    }

    // ========================================================================
    // Choices
    // ========================================================================

    /// The decision this step needs, if any.
    pub fn required_choice(
        &self,
        state: &GameState,
        catalogue: &CardCatalogue,
        player: usize,
    ) -> Result<Option<Choice>> {
        let owner = state.player(player)?;
        let choice = match self {
            Self::SelectAction => {
                let candidates = state
                    .action_spaces
                    .iter()
                    .filter(|space| space.is_available())
                    .map(|space| Candidate::Action(space.kind))
                    .collect();
                Choice::new(ChoiceKind::SelectAction, "Choose an action space", candidates)
            }
            Self::TakeResources { action } => {
                let stock = &state.space(*action)?.stock;
                let baseline = action
                    .grants(state.players.len())
                    .iter()
                    .map(|grant| ResourceCandidate::new(stock.plus(grant)))
                    .collect();
                let candidates =
                    fire_filters(state, catalogue, GameEvent::Action(*action), player, baseline)?;
                Choice::new(
                    ChoiceKind::TakeResources(*action),
                    format!("Take the goods from {action}"),
                    candidates.into_iter().map(Candidate::Resources).collect(),
                )
            }
            Self::Plow { optional } => {
                let candidates = with_decline(
                    *optional,
                    spaces(owner.board.legal_spaces(OccupantKind::Field)),
                );
                Choice::new(ChoiceKind::Plow, "Choose a space to plow", candidates)
                    .with_free_form(FreeForm::Space)
            }
            Self::BuildRooms => {
                let legal = if owner.ledger.can_afford(&owner.room_cost()) {
                    owner.board.legal_spaces(OccupantKind::Room)
                } else {
                    Vec::new()
                };
                Choice::new(
                    ChoiceKind::BuildRoom,
                    format!("Build a room for {}?", owner.room_cost()),
                    with_decline(true, spaces(legal)),
                )
                .with_free_form(FreeForm::Space)
            }
            Self::BuildStables { remaining } => {
                if *remaining == 0 {
                    return Ok(None);
                }
                let legal = if owner.ledger.can_afford(&Player::stable_cost()) {
                    owner.board.legal_spaces(OccupantKind::Stable)
                } else {
                    Vec::new()
                };
                Choice::new(
                    ChoiceKind::BuildStable,
                    format!("Build a stable? ({remaining} left)"),
                    with_decline(true, spaces(legal)),
                )
                .with_free_form(FreeForm::Space)
            }
            Self::Fence { optional } => {
                let singles = owner
                    .board
                    .legal_spaces(OccupantKind::Pasture)
                    .into_iter()
                    .map(|space| vec![vec![space]])
                    .filter(|groups| affordable_pastures(owner, groups))
                    .map(Candidate::Pastures)
                    .collect();
                Choice::new(
                    ChoiceKind::Fence,
                    "Fence pastures; any layout may be proposed",
                    with_decline(*optional, singles),
                )
                .with_free_form(FreeForm::Pastures)
            }
            Self::PlayOccupation { action } => {
                let food = occupation_food(state, owner, *action);
                let candidates = owner
                    .hand_occupations
                    .iter()
                    .filter(|id| state.playable(catalogue, player, id, &food).is_ok())
                    .cloned()
                    .map(Candidate::Card)
                    .collect();
                Choice::new(
                    ChoiceKind::Occupation,
                    format!("Play an occupation for {food}"),
                    candidates,
                )
            }
            Self::PlayImprovement { majors, optional } => {
                let offered = majors
                    .then_some(&state.remaining_majors)
                    .into_iter()
                    .flatten()
                    .chain(&owner.hand_minors);
                let none = ResourceMap::new();
                let candidates = offered
                    .filter(|id| state.playable(catalogue, player, id, &none).is_ok())
                    .cloned()
                    .map(Candidate::Card)
                    .collect();
                Choice::new(
                    ChoiceKind::Improvement,
                    "Play an improvement",
                    with_decline(*optional, candidates),
                )
            }
            Self::Renovate => {
                let candidates = owner
                    .board
                    .house
                    .upgrades()
                    .iter()
                    .copied()
                    .map(Candidate::Material)
                    .collect();
                Choice::new(ChoiceKind::Renovation, "Renovate the house", candidates)
            }
            Self::Sow { optional } => {
                let empty = owner.board.empty_fields() as i32;
                let grain = owner.ledger.get(Resource::Grain);
                let vegetable = owner.ledger.get(Resource::Vegetable);
                let mut candidates = Vec::new();
                for g in 0..=grain.min(empty) {
                    for v in 0..=vegetable.min(empty - g) {
                        if g + v > 0 {
                            candidates.push(Candidate::Sow {
                                grain: g as u8,
                                vegetable: v as u8,
                            });
                        }
                    }
                }
                Choice::new(ChoiceKind::Sow, "Sow empty fields", with_decline(*optional, candidates))
            }
            Self::Bake => {
                let candidates = fire_filters(
                    state,
                    catalogue,
                    GameEvent::Baking,
                    player,
                    vec![ResourceCandidate::default()],
                )?;
                Choice::new(
                    ChoiceKind::Bake,
                    "Bake bread",
                    candidates.into_iter().map(Candidate::Resources).collect(),
                )
            }
            Self::Trade => {
                let candidates = fire_filters(
                    state,
                    catalogue,
                    GameEvent::ResourceTrading,
                    player,
                    trade_baseline(owner),
                )?;
                Choice::new(
                    ChoiceKind::Trade,
                    "Convert goods, or keep everything",
                    candidates.into_iter().map(Candidate::Resources).collect(),
                )
            }
            Self::FamilyGrowth { .. } | Self::BecomeFirstPlayer => return Ok(None),
        };
        Ok(Some(choice))
    }

    // ========================================================================
    // Effects
    // ========================================================================

    /// Apply this step and return follow-ups in push order.
    pub fn effect(
        &self,
        state: &mut GameState,
        catalogue: &CardCatalogue,
        player: usize,
        choice: Option<&Choice>,
    ) -> Result<Vec<Step>> {
        match self {
            Self::SelectAction => {
                let Candidate::Action(action) = self.selected(choice)? else {
                    return Err(self.mismatch(choice));
                };
                let action = *action;
                let space = state.space_mut(action)?;
                if let Some(taker) = space.taken_by {
                    return Err(RuleError::ImpossibleAction(format!(
                        "{action} was already taken by player {taker}"
                    ))
                    .into());
                }
                space.taken_by = Some(player);
                let owner = state.player_mut(player)?;
                owner.actions_remaining = owner.actions_remaining.saturating_sub(1);
                tracing::debug!(player, %action, "action selected");

                let expansion = Self::expand(action, state.player(player)?);
                if action.yields_resources() {
                    return Ok(expansion);
                }
                let mut steps =
                    fire_direct(state, catalogue, GameEvent::Action(action), player, Site::Turn)?;
                steps.extend(expansion);
                Ok(steps)
            }
            Self::TakeResources { action } => {
                let Candidate::Resources(taken) = self.selected(choice)? else {
                    return Err(self.mismatch(choice));
                };
                state
                    .player_mut(player)?
                    .ledger
                    .apply(&taken.paid, &ResourceMap::new(), &taken.change())?;
                state.space_mut(*action)?.stock = taken.returned.clone();
                Ok(in_order(taken.follow_ups.clone()))
            }
            Self::Plow { .. } => match self.selected(choice)? {
                Candidate::Decline => Ok(Vec::new()),
                Candidate::Space(space) => {
                    state.player_mut(player)?.plow(*space)?;
                    fire_direct(state, catalogue, GameEvent::PlowField, player, Site::Turn)
                }
                _ => Err(self.mismatch(choice)),
            },
            Self::BuildRooms => match self.selected(choice)? {
                Candidate::Decline => Ok(Vec::new()),
                Candidate::Space(space) => {
                    state.player_mut(player)?.build_room(*space)?;
                    let mut steps = vec![Self::BuildRooms];
                    steps.extend(fire_direct(
                        state,
                        catalogue,
                        GameEvent::BuildRoom,
                        player,
                        Site::Turn,
                    )?);
                    Ok(steps)
                }
                _ => Err(self.mismatch(choice)),
            },
            Self::BuildStables { remaining } => {
                if *remaining == 0 {
                    return Ok(Vec::new());
                }
                match self.selected(choice)? {
                    Candidate::Decline => Ok(Vec::new()),
                    Candidate::Space(space) => {
                        state.player_mut(player)?.build_stable(*space)?;
                        let mut steps = vec![Self::BuildStables {
                            remaining: remaining - 1,
                        }];
                        steps.extend(fire_direct(
                            state,
                            catalogue,
                            GameEvent::BuildStable,
                            player,
                            Site::Turn,
                        )?);
                        Ok(steps)
                    }
                    _ => Err(self.mismatch(choice)),
                }
            }
            Self::Fence { .. } => match self.selected(choice)? {
                Candidate::Decline => Ok(Vec::new()),
                Candidate::Pastures(groups) => {
                    let fences = state.player_mut(player)?.build_pastures(groups.clone())?;
                    tracing::debug!(player, fences, "pastures fenced");
                    let mut steps = vec![Self::Fence { optional: true }];
                    steps.extend(fire_direct(
                        state,
                        catalogue,
                        GameEvent::BuildPasture,
                        player,
                        Site::Turn,
                    )?);
                    Ok(steps)
                }
                _ => Err(self.mismatch(choice)),
            },
            Self::PlayOccupation { action } => {
                let Candidate::Card(id) = self.selected(choice)? else {
                    return Err(self.mismatch(choice));
                };
                let food = occupation_food(state, state.player(player)?, *action);
                state.play_card(catalogue, player, id, &food)
            }
            Self::PlayImprovement { .. } => match self.selected(choice)? {
                Candidate::Decline => Ok(Vec::new()),
                Candidate::Card(id) => state.play_card(catalogue, player, id, &ResourceMap::new()),
                _ => Err(self.mismatch(choice)),
            },
            Self::Renovate => {
                let Candidate::Material(material) = self.selected(choice)? else {
                    return Err(self.mismatch(choice));
                };
                state.player_mut(player)?.renovate(*material)?;
                fire_direct(state, catalogue, GameEvent::Renovation, player, Site::Turn)
            }
            Self::Sow { .. } => match self.selected(choice)? {
                Candidate::Decline => Ok(Vec::new()),
                Candidate::Sow { grain, vegetable } => {
                    state.player_mut(player)?.sow(*grain, *vegetable)?;
                    fire_direct(state, catalogue, GameEvent::Sow, player, Site::Turn)
                }
                _ => Err(self.mismatch(choice)),
            },
            Self::Bake => {
                let Candidate::Resources(bake) = self.selected(choice)? else {
                    return Err(self.mismatch(choice));
                };
                state
                    .player_mut(player)?
                    .ledger
                    .apply(&bake.paid, &ResourceMap::new(), &bake.change())?;
                Ok(in_order(bake.follow_ups.clone()))
            }
            Self::Trade => {
                let Candidate::Resources(trade) = self.selected(choice)? else {
                    return Err(self.mismatch(choice));
                };
                if trade.is_empty() {
                    return Ok(Vec::new());
                }
                state
                    .player_mut(player)?
                    .ledger
                    .apply(&trade.paid, &ResourceMap::new(), &trade.change())?;
                let mut steps = vec![Self::Trade];
                steps.extend(in_order(trade.follow_ups.clone()));
                Ok(steps)
            }
            Self::FamilyGrowth { needs_room } => {
                state.player_mut(player)?.add_person(*needs_room)?;
                fire_direct(state, catalogue, GameEvent::Birth, player, Site::Turn)
            }
            Self::BecomeFirstPlayer => {
                state.player(player)?;
                state.first_player = player;
                Ok(Vec::new())
            }
        }
    }

    fn selected<'c>(&self, choice: Option<&'c Choice>) -> Result<&'c Candidate> {
        choice
            .and_then(Choice::selected)
            .ok_or_else(|| EngineFault::MissingChoice(self.name()).into())
    }

    fn mismatch(&self, choice: Option<&Choice>) -> crate::error::GameError {
        EngineFault::CandidateMismatch {
            step: self.name(),
            candidate: format!("{:?}", choice.and_then(Choice::selected)),
        }
        .into()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn spaces(spaces: Vec<Space>) -> Vec<Candidate> {
    spaces.into_iter().map(Candidate::Space).collect()
}

fn with_decline(optional: bool, candidates: Vec<Candidate>) -> Vec<Candidate> {
    if !optional {
        return candidates;
    }
    std::iter::once(Candidate::Decline).chain(candidates).collect()
}

fn affordable_pastures(player: &Player, groups: &[Vec<Space>]) -> bool {
    let pastures = Occupant::Pastures {
        groups: groups.to_vec(),
    };
    player
        .board
        .check(&pastures)
        .map(|placement| player.ledger.can_afford(&Player::fence_cost(placement.new_fences.len())))
        .unwrap_or(false)
}

fn occupation_food(state: &GameState, player: &Player, action: ActionKind) -> ResourceMap {
    let food = action.occupation_food(state.players.len(), player.played_occupations.len());
    ResourceMap::of(Resource::Food, food)
}

/// Keep everything, plus one "release an animal" variant per species when
/// the farm is over capacity.
fn trade_baseline(player: &Player) -> Vec<ResourceCandidate> {
    let mut baseline = vec![ResourceCandidate::default()];
    if player.check_animals().is_ok() {
        return baseline;
    }
    for animal in Resource::ANIMALS {
        if player.ledger.get(animal) > 0 {
            baseline.push(ResourceCandidate::default().paying(&ResourceMap::of(animal, 1)));
        }
    }
    baseline
}

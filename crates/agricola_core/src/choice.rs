//! Choices and candidates.
//!
//! A [`Choice`] is a decision point with an order-stable list of legal
//! [`Candidate`]s. Choices with a single candidate resolve themselves; the
//! rest are externalized as an observation and resolved by a [`Decision`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actions::ActionKind;
use crate::board::{HouseMaterial, Space};
use crate::cards::CardId;
use crate::error::RuleError;
use crate::resources::ResourceMap;
use crate::step::Step;

// ============================================================================
// Resource candidates
// ============================================================================

/// One way of resolving a resource-granting decision.
///
/// The ledger receives `taken + bonus - returned` and pays `paid`.
/// `returned` goods go back onto the action space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCandidate {
    /// Goods taken from the action space.
    pub taken: ResourceMap,
    /// Extra goods from card abilities.
    pub bonus: ResourceMap,
    /// Goods the player gives up.
    pub paid: ResourceMap,
    /// Goods left on the action space.
    pub returned: ResourceMap,
    /// Steps queued when this candidate is chosen.
    pub follow_ups: Vec<Step>,
    /// Cards that shaped this candidate, in application order.
    pub sources: Vec<CardId>,
}

impl ResourceCandidate {
    /// Candidate that takes `taken` and nothing else.
    #[must_use]
    pub fn new(taken: ResourceMap) -> Self {
        Self {
            taken,
            ..Self::default()
        }
    }

    /// Builder: pay `goods` as well.
    #[must_use]
    pub fn paying(mut self, goods: &ResourceMap) -> Self {
        self.paid.merge(goods);
        self
    }

    /// Builder: gain `goods` on top.
    #[must_use]
    pub fn gaining(mut self, goods: &ResourceMap) -> Self {
        self.bonus.merge(goods);
        self
    }

    /// Builder: leave `goods` on the space.
    #[must_use]
    pub fn returning(mut self, goods: &ResourceMap) -> Self {
        self.returned.merge(goods);
        self
    }

    /// Builder: record the card that produced this variant.
    #[must_use]
    pub fn from_card(mut self, card: &str) -> Self {
        self.sources.push(CardId::from(card));
        self
    }

    /// Builder: queue a follow-up step.
    #[must_use]
    pub fn then(mut self, step: Step) -> Self {
        self.follow_ups.push(step);
        self
    }

    /// Goods credited to the player, net of payments.
    #[must_use]
    pub fn change(&self) -> ResourceMap {
        self.taken.plus(&self.bonus).minus(&self.returned)
    }

    /// Net effect on the ledger.
    #[must_use]
    pub fn net(&self) -> ResourceMap {
        self.change().minus(&self.paid)
    }

    /// Whether `counts` covers the payment and no counter would go negative.
    #[must_use]
    pub fn is_affordable(&self, counts: &ResourceMap) -> bool {
        let pays = self
            .paid
            .iter()
            .all(|(resource, amount)| counts.get(resource) >= amount);
        pays && counts.plus(&self.net()).iter().all(|(_, amount)| amount >= 0)
    }

    /// Whether choosing this candidate changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.net().is_empty() && self.returned.is_empty() && self.follow_ups.is_empty()
    }
}

impl fmt::Display for ResourceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.net())?;
        if !self.sources.is_empty() {
            let names: Vec<&str> = self.sources.iter().map(|id| id.0.as_str()).collect();
            write!(f, " ({})", names.join(", "))?;
        }
        Ok(())
    }
}

// ============================================================================
// Candidates
// ============================================================================

/// Kinds of decision the engine can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceKind {
    /// Pick an action space.
    SelectAction,
    /// Pick how to take an action's goods.
    TakeResources(ActionKind),
    /// Pick a space to plow.
    Plow,
    /// Pick a space for a room.
    BuildRoom,
    /// Pick a space for a stable.
    BuildStable,
    /// Pick pastures to fence.
    Fence,
    /// Pick an occupation to play.
    Occupation,
    /// Pick an improvement to play.
    Improvement,
    /// Pick a renovation material.
    Renovation,
    /// Pick what to sow.
    Sow,
    /// Pick how to bake.
    Bake,
    /// Pick a conversion.
    Trade,
}

impl fmt::Display for ChoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TakeResources(action) => return write!(f, "take_resources:{action}"),
            Self::SelectAction => "select_action",
            Self::Plow => "plow",
            Self::BuildRoom => "build_room",
            Self::BuildStable => "build_stable",
            Self::Fence => "fence",
            Self::Occupation => "occupation",
            Self::Improvement => "improvement",
            Self::Renovation => "renovation",
            Self::Sow => "sow",
            Self::Bake => "bake",
            Self::Trade => "trade",
        };
        f.write_str(name)
    }
}

/// One legal resolution of a [`Choice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Candidate {
    /// Skip an optional step.
    Decline,
    /// Use an action space.
    Action(ActionKind),
    /// Take, pay and gain goods.
    Resources(ResourceCandidate),
    /// A single board space.
    Space(Space),
    /// Pastures to build together; each inner list is one pasture.
    Pastures(Vec<Vec<Space>>),
    /// A card.
    Card(CardId),
    /// Renovate to this material.
    Material(HouseMaterial),
    /// Sow this many grain and vegetable fields.
    Sow {
        /// Grain fields.
        grain: u8,
        /// Vegetable fields.
        vegetable: u8,
    },
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decline => f.write_str("decline"),
            Self::Action(action) => write!(f, "{action}"),
            Self::Resources(candidate) => write!(f, "{candidate}"),
            Self::Space(space) => write!(f, "{space}"),
            Self::Pastures(groups) => {
                let parts: Vec<String> = groups
                    .iter()
                    .map(|group| {
                        let cells: Vec<String> = group.iter().map(ToString::to_string).collect();
                        format!("[{}]", cells.join(" "))
                    })
                    .collect();
                write!(f, "pastures {}", parts.join(" "))
            }
            Self::Card(id) => write!(f, "{id}"),
            Self::Material(material) => write!(f, "renovate to {material}"),
            Self::Sow { grain, vegetable } => {
                write!(f, "sow {grain} grain, {vegetable} vegetable")
            }
        }
    }
}

/// Decisions accepted besides picking a listed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeForm {
    /// Only listed candidates.
    #[default]
    None,
    /// Any single space; the board validates it.
    Space,
    /// Any pasture layout; the board validates it.
    Pastures,
}

/// Presentation view of one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateView {
    /// Index to send back in a pick decision.
    pub index: usize,
    /// Human-readable label.
    pub label: String,
    /// Aggregated net goods, for resource candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceMap>,
}

/// A decision returned by a decision source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Pick the candidate at `index`.
    Pick {
        /// Candidate index.
        index: usize,
    },
    /// Pick the decline candidate.
    Decline,
    /// Pick the space candidate at `space`.
    Space {
        /// Board space.
        space: Space,
    },
    /// Propose a pasture layout.
    Pastures {
        /// Each inner list is one pasture.
        pastures: Vec<Vec<Space>>,
    },
    /// Output that could not be read as a decision. Never on the wire.
    #[serde(skip)]
    Malformed {
        /// Parser message.
        reason: String,
    },
}

// ============================================================================
// Choice
// ============================================================================

/// A pending decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// What is being decided.
    pub kind: ChoiceKind,
    /// Prompt shown to agents.
    pub prompt: String,
    candidates: Vec<Candidate>,
    free_form: FreeForm,
    selected: Option<Candidate>,
}

impl Choice {
    /// Choice between `candidates`.
    #[must_use]
    pub fn new(kind: ChoiceKind, prompt: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
            candidates,
            free_form: FreeForm::None,
            selected: None,
        }
    }

    /// Builder: also accept free-form decisions.
    #[must_use]
    pub fn with_free_form(mut self, free_form: FreeForm) -> Self {
        self.free_form = free_form;
        self
    }

    /// Listed candidates.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Accepted free-form decision.
    #[must_use]
    pub const fn free_form(&self) -> FreeForm {
        self.free_form
    }

    /// Whether there is nothing to decide.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.candidates.len() == 1
    }

    /// Whether no decision could ever resolve this choice.
    #[must_use]
    pub fn is_dead_end(&self) -> bool {
        self.candidates.is_empty() && self.free_form == FreeForm::None
    }

    /// Select the only candidate of a forced choice.
    pub fn auto_resolve(&mut self) -> bool {
        if self.is_forced() {
            self.selected = self.candidates.first().cloned();
        }
        self.selected.is_some()
    }

    /// Apply an external decision.
    pub fn resolve(&mut self, decision: &Decision) -> Result<(), RuleError> {
        let selected = match decision {
            Decision::Pick { index } => self.candidates.get(*index).cloned().ok_or_else(|| {
                RuleError::InvalidChoice(format!(
                    "candidate {index} out of range for {} ({} candidates)",
                    self.kind,
                    self.candidates.len()
                ))
            })?,
            Decision::Decline => self
                .candidates
                .iter()
                .find(|candidate| **candidate == Candidate::Decline)
                .cloned()
                .ok_or_else(|| RuleError::InvalidChoice(format!("{} cannot be declined", self.kind)))?,
            Decision::Space { space } => {
                let proposed = Candidate::Space(*space);
                if self.free_form != FreeForm::Space && !self.candidates.contains(&proposed) {
                    return Err(RuleError::InvalidChoice(format!(
                        "{space} is not a candidate for {}",
                        self.kind
                    )));
                }
                proposed
            }
            Decision::Pastures { pastures } => {
                let proposed = Candidate::Pastures(pastures.clone());
                if self.free_form != FreeForm::Pastures && !self.candidates.contains(&proposed) {
                    return Err(RuleError::InvalidChoice(format!(
                        "{} does not accept a pasture layout",
                        self.kind
                    )));
                }
                proposed
            }
            Decision::Malformed { reason } => {
                return Err(RuleError::InvalidChoice(format!(
                    "malformed decision for {}: {reason}",
                    self.kind
                )));
            }
        };
        self.selected = Some(selected);
        Ok(())
    }

    /// The chosen candidate.
    #[must_use]
    pub fn selected(&self) -> Option<&Candidate> {
        self.selected.as_ref()
    }

    /// Presentation views, one per listed candidate.
    #[must_use]
    pub fn summarize(&self) -> Vec<CandidateView> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| view(index, candidate))
            .collect()
    }

    /// Presentation view of the chosen candidate.
    #[must_use]
    pub fn selected_summary(&self) -> Option<CandidateView> {
        let selected = self.selected.as_ref()?;
        let index = self
            .candidates
            .iter()
            .position(|candidate| candidate == selected)
            .unwrap_or(self.candidates.len());
        Some(view(index, selected))
    }
}

fn view(index: usize, candidate: &Candidate) -> CandidateView {
    CandidateView {
        index,
        label: candidate.to_string(),
        resources: match candidate {
            Candidate::Resources(resources) => Some(resources.net()),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Resource;

    fn wood(n: i32) -> ResourceMap {
        ResourceMap::of(Resource::Wood, n)
    }

    #[test]
    fn test_net_and_affordability() {
        let candidate = ResourceCandidate::new(wood(3))
            .returning(&wood(1))
            .gaining(&ResourceMap::of(Resource::Food, 2));
        assert_eq!(candidate.net().get(Resource::Wood), 2);
        assert!(candidate.is_affordable(&ResourceMap::new()));

        let trade = ResourceCandidate::default()
            .paying(&ResourceMap::of(Resource::Sheep, 1))
            .gaining(&ResourceMap::of(Resource::Food, 2));
        assert!(!trade.is_affordable(&ResourceMap::new()));
        assert!(trade.is_affordable(&ResourceMap::of(Resource::Sheep, 1)));
    }

    #[test]
    fn test_forced_choice_auto_resolves() {
        let mut choice = Choice::new(ChoiceKind::Plow, "plow", vec![Candidate::Space(Space::new(0, 1))]);
        assert!(choice.is_forced());
        assert!(choice.auto_resolve());
        assert_eq!(choice.selected(), Some(&Candidate::Space(Space::new(0, 1))));
    }

    #[test]
    fn test_free_form_is_not_a_dead_end() {
        let choice = Choice::new(ChoiceKind::Fence, "fence", Vec::new())
            .with_free_form(FreeForm::Pastures);
        assert!(!choice.is_forced());
        assert!(!choice.is_dead_end());
    }

    #[test]
    fn test_free_form_space_reaches_board() {
        let mut choice = Choice::new(
            ChoiceKind::Plow,
            "plow",
            vec![Candidate::Space(Space::new(0, 1)), Candidate::Space(Space::new(0, 2))],
        )
        .with_free_form(FreeForm::Space);
        choice.resolve(&Decision::Space { space: Space::new(0, 0) }).unwrap();
        assert_eq!(choice.selected(), Some(&Candidate::Space(Space::new(0, 0))));
        assert_eq!(choice.selected_summary().map(|v| v.index), Some(2));
    }

    #[test]
    fn test_resolve_rejects_out_of_range() {
        let mut choice = Choice::new(
            ChoiceKind::BuildRoom,
            "room",
            vec![Candidate::Decline, Candidate::Space(Space::new(2, 0))],
        );
        let err = choice.resolve(&Decision::Pick { index: 2 }).unwrap_err();
        assert!(matches!(err, RuleError::InvalidChoice(_)));
        assert!(choice.selected().is_none());

        choice.resolve(&Decision::Space { space: Space::new(2, 0) }).unwrap();
        assert_eq!(choice.selected_summary().map(|v| v.index), Some(1));
    }

    #[test]
    fn test_decline_requires_decline_candidate() {
        let mut choice = Choice::new(ChoiceKind::Plow, "plow", vec![Candidate::Space(Space::new(0, 1))]);
        assert!(choice.resolve(&Decision::Decline).is_err());
    }

    #[test]
    fn test_malformed_is_invalid_choice() {
        let mut choice = Choice::new(ChoiceKind::Plow, "plow", vec![Candidate::Decline]);
        let err = choice
            .resolve(&Decision::Malformed {
                reason: "expected value".into(),
            })
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidChoice(ref m) if m.contains("expected value")));
        let wire: serde_json::Result<Decision> = serde_json::from_str(r#"{"type":"malformed","reason":"x"}"#);
        assert!(wire.is_err());
    }

    #[test]
    fn test_pastures_need_free_form() {
        let layout = vec![vec![Space::new(0, 3), Space::new(0, 4)]];
        let mut closed = Choice::new(ChoiceKind::Plow, "plow", vec![Candidate::Decline]);
        assert!(closed
            .resolve(&Decision::Pastures { pastures: layout.clone() })
            .is_err());

        let mut open = Choice::new(ChoiceKind::Fence, "fence", vec![Candidate::Decline])
            .with_free_form(FreeForm::Pastures);
        open.resolve(&Decision::Pastures { pastures: layout.clone() }).unwrap();
        assert_eq!(open.selected(), Some(&Candidate::Pastures(layout)));
    }

    #[test]
    fn test_decision_wire_format() {
        let pick: Decision = serde_json::from_str(r#"{"type":"pick","index":3}"#).unwrap();
        assert_eq!(pick, Decision::Pick { index: 3 });
        let space: Decision = serde_json::from_str(r#"{"type":"space","space":[1,2]}"#).unwrap();
        assert_eq!(space, Decision::Space { space: Space::new(1, 2) });
    }

    #[test]
    fn test_summary_aggregates_resources() {
        let candidate = ResourceCandidate::new(wood(3))
            .gaining(&wood(1))
            .from_card("Woodcutter");
        let choice = Choice::new(
            ChoiceKind::TakeResources(ActionKind::Forest),
            "take",
            vec![Candidate::Resources(candidate)],
        );
        let views = choice.summarize();
        assert_eq!(views[0].resources.as_ref().map(|r| r.get(Resource::Wood)), Some(4));
        assert!(views[0].label.contains("Woodcutter"));
    }
}

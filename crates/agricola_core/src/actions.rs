//! Action spaces.
//!
//! Each round one new action space is revealed. Accumulating spaces gain
//! goods at every round start and are emptied when taken. The set of spaces
//! on offer depends on the number of players.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resources::{Resource, ResourceMap};

/// Every kind of action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Build rooms and/or stables.
    FarmExpansion,
    /// Become first player, then optionally play a minor improvement.
    MeetingPlace,
    /// Take 1 grain.
    GrainSeeds,
    /// Plow one field.
    Farmland,
    /// Play an occupation (first one free).
    Lessons,
    /// Take 2 food.
    DayLaborer,
    /// Accumulates 3 wood.
    Forest,
    /// Accumulates 1 clay.
    ClayPit,
    /// Accumulates 1 reed.
    ReedBank,
    /// Accumulates 1 food.
    Fishing,
    /// Accumulates 1 wood (4 players).
    Copse,
    /// Accumulates 2 wood (3-4 players).
    Grove,
    /// Accumulates clay (3-4 players).
    Hollow,
    /// Fixed building material (2-4 players).
    ResourceMarket,
    /// Second occupation space (3-4 players).
    SecondLessons,
    /// Accumulates 1 food (4 players).
    TravelingPlayers,
    /// Buy a major or minor improvement.
    MajorImprovement,
    /// Accumulates 1 sheep.
    SheepMarket,
    /// Build fences.
    Fencing,
    /// Sow and/or bake bread.
    GrainUtilization,
    /// Family growth with a free room, then an optional minor improvement.
    BasicWishForChildren,
    /// Renovate, then an optional improvement.
    HouseRedevelopment,
    /// Accumulates 1 stone.
    WesternQuarry,
    /// Take 1 vegetable.
    VegetableSeeds,
    /// Accumulates 1 wild boar.
    PigMarket,
    /// Accumulates 1 cattle.
    CattleMarket,
    /// Accumulates 1 stone.
    EasternQuarry,
    /// Plow and/or sow.
    Cultivation,
    /// Family growth even without a free room.
    UrgentWishForChildren,
    /// Renovate, then optionally build fences.
    FarmRedevelopment,
}

impl ActionKind {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FarmExpansion => "FarmExpansion",
            Self::MeetingPlace => "MeetingPlace",
            Self::GrainSeeds => "GrainSeeds",
            Self::Farmland => "Farmland",
            Self::Lessons => "Lessons",
            Self::DayLaborer => "DayLaborer",
            Self::Forest => "Forest",
            Self::ClayPit => "ClayPit",
            Self::ReedBank => "ReedBank",
            Self::Fishing => "Fishing",
            Self::Copse => "Copse",
            Self::Grove => "Grove",
            Self::Hollow => "Hollow",
            Self::ResourceMarket => "ResourceMarket",
            Self::SecondLessons => "SecondLessons",
            Self::TravelingPlayers => "TravelingPlayers",
            Self::MajorImprovement => "MajorImprovement",
            Self::SheepMarket => "SheepMarket",
            Self::Fencing => "Fencing",
            Self::GrainUtilization => "GrainUtilization",
            Self::BasicWishForChildren => "BasicWishForChildren",
            Self::HouseRedevelopment => "HouseRedevelopment",
            Self::WesternQuarry => "WesternQuarry",
            Self::VegetableSeeds => "VegetableSeeds",
            Self::PigMarket => "PigMarket",
            Self::CattleMarket => "CattleMarket",
            Self::EasternQuarry => "EasternQuarry",
            Self::Cultivation => "Cultivation",
            Self::UrgentWishForChildren => "UrgentWishForChildren",
            Self::FarmRedevelopment => "FarmRedevelopment",
        }
    }

    /// Goods added to the space at every round start.
    #[must_use]
    pub fn accumulation(self, players: usize) -> Option<ResourceMap> {
        let (resource, amount) = match self {
            Self::Forest => (Resource::Wood, 3),
            Self::Grove => (Resource::Wood, 2),
            Self::Copse => (Resource::Wood, 1),
            Self::ClayPit => (Resource::Clay, 1),
            Self::Hollow => (Resource::Clay, if players >= 4 { 2 } else { 1 }),
            Self::ReedBank => (Resource::Reed, 1),
            Self::Fishing | Self::TravelingPlayers => (Resource::Food, 1),
            Self::WesternQuarry | Self::EasternQuarry => (Resource::Stone, 1),
            Self::SheepMarket => (Resource::Sheep, 1),
            Self::PigMarket => (Resource::Boar, 1),
            Self::CattleMarket => (Resource::Cattle, 1),
            _ => return None,
        };
        Some(ResourceMap::of(resource, amount))
    }

    /// Fixed goods granted on top of the accumulated stock. More than one
    /// entry means the player picks one of them.
    #[must_use]
    pub fn grants(self, players: usize) -> Vec<ResourceMap> {
        let food = |n| ResourceMap::of(Resource::Food, n);
        match self {
            Self::DayLaborer => vec![food(2)],
            Self::GrainSeeds => vec![ResourceMap::of(Resource::Grain, 1)],
            Self::VegetableSeeds => vec![ResourceMap::of(Resource::Vegetable, 1)],
            Self::ResourceMarket => match players {
                3 => vec![
                    food(1).with(Resource::Reed, 1),
                    food(1).with(Resource::Stone, 1),
                ],
                4 => vec![food(1).with(Resource::Stone, 1).with(Resource::Reed, 1)],
                _ => vec![food(1).with(Resource::Stone, 1)],
            },
            _ => vec![ResourceMap::new()],
        }
    }

    /// Whether taking this space hands out goods.
    #[must_use]
    pub fn yields_resources(self) -> bool {
        self.accumulation(4).is_some()
            || matches!(
                self,
                Self::DayLaborer | Self::GrainSeeds | Self::VegetableSeeds | Self::ResourceMarket
            )
    }

    /// Food paid to play an occupation from this space.
    #[must_use]
    pub fn occupation_food(self, players: usize, played: usize) -> i32 {
        match (self, players) {
            (Self::SecondLessons, 3) => 2,
            (Self::SecondLessons, _) if played < 2 => 1,
            (Self::SecondLessons, _) => 2,
            _ if played == 0 => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spaces available from the first round.
#[must_use]
pub fn starting_actions(players: usize) -> Vec<ActionKind> {
    use ActionKind::*;
    let mut actions = vec![
        FarmExpansion,
        MeetingPlace,
        GrainSeeds,
        Farmland,
        Lessons,
        DayLaborer,
        Forest,
        ClayPit,
        ReedBank,
        Fishing,
    ];
    match players {
        3 => actions.extend([Grove, ResourceMarket, Hollow, SecondLessons]),
        4 => actions.extend([
            Copse,
            Grove,
            ResourceMarket,
            Hollow,
            SecondLessons,
            TravelingPlayers,
        ]),
        _ => {}
    }
    actions
}

/// Round cards grouped by stage. One card is revealed per round, so the
/// group sizes are also the stage lengths.
#[must_use]
pub fn round_cards() -> Vec<Vec<ActionKind>> {
    use ActionKind::*;
    vec![
        vec![MajorImprovement, SheepMarket, Fencing, GrainUtilization],
        vec![BasicWishForChildren, HouseRedevelopment, WesternQuarry],
        vec![VegetableSeeds, PigMarket],
        vec![CattleMarket, EasternQuarry],
        vec![Cultivation, UrgentWishForChildren],
        vec![FarmRedevelopment],
    ]
}

/// An action space on the shared board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionSpace {
    /// What the space does.
    pub kind: ActionKind,
    /// Goods waiting on the space.
    pub stock: ResourceMap,
    /// Player who took it this round.
    pub taken_by: Option<usize>,
}

impl ActionSpace {
    /// Empty, untaken space.
    #[must_use]
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            stock: ResourceMap::new(),
            taken_by: None,
        }
    }

    /// Whether a worker can still go here this round.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.taken_by.is_none()
    }

    /// Round-start upkeep: free the space and add its accumulation.
    pub fn replenish(&mut self, players: usize) {
        self.taken_by = None;
        if let Some(gain) = self.kind.accumulation(players) {
            self.stock.merge(&gain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_cards_cover_fourteen_rounds() {
        let lengths: Vec<usize> = round_cards().iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![4, 3, 2, 2, 2, 1]);
    }

    #[test]
    fn test_player_count_extends_starting_actions() {
        assert_eq!(starting_actions(2).len(), 10);
        assert_eq!(starting_actions(3).len(), 14);
        assert_eq!(starting_actions(4).len(), 16);
    }

    #[test]
    fn test_replenish_accumulates() {
        let mut space = ActionSpace::new(ActionKind::Forest);
        space.taken_by = Some(1);
        space.replenish(2);
        space.replenish(2);
        assert!(space.is_available());
        assert_eq!(space.stock.get(Resource::Wood), 6);
    }

    #[test]
    fn test_hollow_scales_with_players() {
        let three = ActionKind::Hollow.accumulation(3).unwrap();
        let four = ActionKind::Hollow.accumulation(4).unwrap();
        assert_eq!(three.get(Resource::Clay), 1);
        assert_eq!(four.get(Resource::Clay), 2);
    }

    #[test]
    fn test_occupation_food_costs() {
        assert_eq!(ActionKind::Lessons.occupation_food(2, 0), 0);
        assert_eq!(ActionKind::Lessons.occupation_food(2, 1), 1);
        assert_eq!(ActionKind::SecondLessons.occupation_food(3, 0), 2);
        assert_eq!(ActionKind::SecondLessons.occupation_food(4, 1), 1);
        assert_eq!(ActionKind::SecondLessons.occupation_food(4, 2), 2);
    }
}

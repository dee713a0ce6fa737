//! Player state and farm construction.
//!
//! Every construction method validates the placement, pays, then places.
//! Validation happens before payment so a failed call leaves the player
//! untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::{Board, HouseMaterial, Occupant, Space};
use crate::cards::CardId;
use crate::error::{PlacementError, Result, RuleError};
use crate::resources::{Ledger, Resource, ResourceMap};

/// Material per room.
pub const ROOM_MATERIAL: i32 = 5;
/// Reed per room.
pub const ROOM_REED: i32 = 2;
/// Wood per stable.
pub const STABLE_WOOD: i32 = 2;

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// Seat index.
    pub id: usize,
    /// Resource counters.
    pub ledger: Ledger,
    /// Farmyard.
    pub board: Board,
    /// Occupations in hand.
    pub hand_occupations: Vec<CardId>,
    /// Minor improvements in hand.
    pub hand_minors: Vec<CardId>,
    /// Occupations played, in order.
    pub played_occupations: Vec<CardId>,
    /// Minor improvements played, in order.
    pub played_minors: Vec<CardId>,
    /// Major improvements bought, in order.
    pub played_majors: Vec<CardId>,
    /// Workers left to place this round.
    pub actions_remaining: u8,
    /// Goods granted at the start of future rounds.
    pub futures: BTreeMap<u8, ResourceMap>,
    /// Why the last attempt failed, until the next success.
    pub last_error: Option<String>,
}

impl Player {
    /// Player with an empty hand.
    #[must_use]
    pub fn new(id: usize, initial: ResourceMap, board: Board) -> Self {
        Self {
            id,
            ledger: Ledger::new(initial),
            board,
            hand_occupations: Vec::new(),
            hand_minors: Vec::new(),
            played_occupations: Vec::new(),
            played_minors: Vec::new(),
            played_majors: Vec::new(),
            actions_remaining: 0,
            futures: BTreeMap::new(),
            last_error: None,
        }
    }

    /// Family members on the farm.
    #[must_use]
    pub fn people(&self) -> i32 {
        self.ledger.get(Resource::People)
    }

    /// Every played card, in play order within each family.
    pub fn played_cards(&self) -> impl Iterator<Item = &CardId> {
        self.played_occupations
            .iter()
            .chain(&self.played_minors)
            .chain(&self.played_majors)
    }

    // ------------------------------------------------------------------------
    // Futures
    // ------------------------------------------------------------------------

    /// Schedule `goods` for the start of `round`.
    pub fn add_future(&mut self, round: u8, goods: &ResourceMap) {
        self.futures.entry(round).or_default().merge(goods);
    }

    /// Remove and return what is scheduled for `round`.
    pub fn take_futures(&mut self, round: u8) -> Option<ResourceMap> {
        self.futures.remove(&round)
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    /// Cost of one room in the current house material.
    #[must_use]
    pub fn room_cost(&self) -> ResourceMap {
        ResourceMap::of(self.board.house.material.resource(), ROOM_MATERIAL)
            .with(Resource::Reed, ROOM_REED)
    }

    /// Cost of one stable.
    #[must_use]
    pub fn stable_cost() -> ResourceMap {
        ResourceMap::of(Resource::Wood, STABLE_WOOD).with(Resource::StablesAvailable, 1)
    }

    /// Build a room at `space`.
    pub fn build_room(&mut self, space: Space) -> Result<()> {
        let room = Occupant::Room { space };
        self.board.check(&room)?;
        self.ledger.pay(&self.room_cost())?;
        self.board.place(room)?;
        Ok(())
    }

    /// Build a stable at `space`.
    pub fn build_stable(&mut self, space: Space) -> Result<()> {
        let stable = Occupant::Stable { space };
        self.board.check(&stable)?;
        self.ledger.pay(&Self::stable_cost())?;
        self.board.place(stable)?;
        Ok(())
    }

    /// Fence `groups`, paying one wood and one fence per new fence segment.
    ///
    /// Returns the number of fences built.
    pub fn build_pastures(&mut self, groups: Vec<Vec<Space>>) -> Result<usize> {
        let pastures = Occupant::Pastures { groups };
        let fences = self.board.check(&pastures)?.new_fences.len();
        self.ledger.pay(&Self::fence_cost(fences))?;
        self.board.place(pastures)?;
        Ok(fences)
    }

    /// Cost of `fences` new fence segments.
    #[must_use]
    pub fn fence_cost(fences: usize) -> ResourceMap {
        let n = fences as i32;
        ResourceMap::of(Resource::Wood, n).with(Resource::FencesAvailable, n)
    }

    /// Plow a field at `space`.
    pub fn plow(&mut self, space: Space) -> Result<()> {
        self.board.place(Occupant::Field { space })?;
        Ok(())
    }

    /// Renovate every room to `material`.
    pub fn renovate(&mut self, material: HouseMaterial) -> Result<()> {
        let cost = self.board.renovation_cost(material)?;
        self.ledger.pay(&cost)?;
        self.board.upgrade_house(material)?;
        Ok(())
    }

    /// Sow empty fields, paying one seed per field.
    pub fn sow(&mut self, grain: u8, vegetable: u8) -> Result<()> {
        let requested = usize::from(grain) + usize::from(vegetable);
        let available = self.board.empty_fields();
        if requested > available {
            return Err(RuleError::from(PlacementError::NotEnoughFields {
                requested,
                available,
            })
            .into());
        }
        let seeds = ResourceMap::new()
            .with(Resource::Grain, i32::from(grain))
            .with(Resource::Vegetable, i32::from(vegetable));
        self.ledger.pay(&seeds)?;
        self.board.sow(grain, vegetable)?;
        Ok(())
    }

    /// Add a family member. With `needs_room`, there must be more rooms
    /// than people.
    pub fn add_person(&mut self, needs_room: bool) -> Result<()> {
        if self.ledger.get(Resource::PeopleAvailable) <= 0 {
            return Err(RuleError::ImpossibleAction("no family members left to add".into()).into());
        }
        let rooms = self.board.rooms().len() as i32;
        if needs_room && rooms <= self.people() {
            return Err(RuleError::ImpossibleAction(format!(
                "{} people already fill {rooms} rooms",
                self.people()
            ))
            .into());
        }
        let birth = ResourceMap::of(Resource::People, 1).with(Resource::PeopleAvailable, -1);
        self.ledger.grant(&birth)?;
        Ok(())
    }

    /// Whether the farm can house every animal the player holds.
    pub fn check_animals(&self) -> std::result::Result<(), PlacementError> {
        let animals = self.ledger.animals();
        if self.board.can_hold(&animals) {
            return Ok(());
        }
        Err(PlacementError::OverCapacity {
            sheep: animals.get(Resource::Sheep),
            boar: animals.get(Resource::Boar),
            cattle: animals.get(Resource::Cattle),
        })
    }
}

//! Animal housing capacity.
//!
//! Every place that can hold animals becomes a slot. A slot holds animals of
//! a single species, and a species may spread over several slots. Whether a
//! herd fits is therefore a partition problem: each species needs a group of
//! slots whose total capacity covers its count, with no slot shared.
//!
//! Slots:
//! - one slot of 1 per stable outside every pasture,
//! - one slot of 1 for the house pet,
//! - one slot per pasture of `size * 2^(stables + 1) + pasture_bonus`.

use crate::board::Board;
use crate::resources::{Resource, ResourceMap};

/// Capacity slots of a board, largest first.
#[must_use]
pub fn capacity_slots(board: &Board) -> Vec<u32> {
    let mut slots = vec![1; board.free_stables() + 1];
    for pasture in board.pastures() {
        let stables = board.stables_in(pasture) as u32;
        let size = pasture.size() as u32;
        slots.push(size * 2u32.pow(stables + 1) + board.pasture_bonus);
    }
    slots.sort_unstable_by(|a, b| b.cmp(a));
    slots
}

/// Whether `counts` can be split over `slots` so each count gets its own
/// group of slots with enough total capacity.
///
/// Exact: searches every way of assigning slots to the largest remaining
/// requirement before moving to the next one.
#[must_use]
pub fn can_hold(slots: &[u32], counts: &[u32]) -> bool {
    let mut requirements: Vec<u32> = counts.iter().copied().filter(|&n| n > 0).collect();
    requirements.sort_unstable_by(|a, b| b.cmp(a));
    let mut slots = slots.to_vec();
    slots.sort_unstable_by(|a, b| b.cmp(a));
    fits(&slots, &requirements)
}

fn fits(slots: &[u32], requirements: &[u32]) -> bool {
    let Some((&need, rest)) = requirements.split_first() else {
        return true;
    };
    let total: u32 = slots.iter().sum();
    let wanted: u32 = requirements.iter().sum();
    if total < wanted {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    let mut used = vec![false; slots.len()];
    choose(slots, &mut used, 0, need, rest)
}

/// Pick a subset of `slots` (marked in `used`) covering `need`, then try to
/// fit `rest` into what is left.
fn choose(slots: &[u32], used: &mut [bool], start: usize, need: u32, rest: &[u32]) -> bool {
    let covered: u32 = slots
        .iter()
        .zip(used.iter())
        .filter(|(_, used)| **used)
        .map(|(slot, _)| *slot)
        .sum();
    if covered >= need {
        let remaining: Vec<u32> = slots
            .iter()
            .zip(used.iter())
            .filter(|(_, used)| !**used)
            .map(|(slot, _)| *slot)
            .collect();
        return fits(&remaining, rest);
    }
    for i in start..slots.len() {
        // Equal slots are interchangeable; only branch on the first unused one.
        if i > start && slots[i] == slots[i - 1] && !used[i - 1] {
            continue;
        }
        used[i] = true;
        if choose(slots, used, i + 1, need, rest) {
            return true;
        }
        used[i] = false;
    }
    false
}

impl Board {
    /// Whether this farm can house `animals` (only animal entries are read).
    #[must_use]
    pub fn can_hold(&self, animals: &ResourceMap) -> bool {
        let counts: Vec<u32> = Resource::ANIMALS
            .iter()
            .map(|&animal| animals.get(animal).max(0) as u32)
            .collect();
        can_hold(&capacity_slots(self), &counts)
    }
}

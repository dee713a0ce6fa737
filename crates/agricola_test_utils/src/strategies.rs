//! Proptest strategies for board, ledger and capacity properties.

use agricola_core::board::{Occupant, Space};
use agricola_core::resources::{Resource, ResourceMap};
use proptest::prelude::*;

/// Any space on a `rows` x `cols` board, plus one row and column outside it.
pub fn arb_space(rows: u8, cols: u8) -> impl Strategy<Value = Space> {
    (0..=rows, 0..=cols).prop_map(|(row, col)| Space::new(row, col))
}

/// A small group of spaces, possibly disconnected or off the board.
pub fn arb_group(rows: u8, cols: u8) -> impl Strategy<Value = Vec<Space>> {
    proptest::collection::vec(arb_space(rows, cols), 1..4)
}

/// Any occupant, legal or not.
pub fn arb_occupant(rows: u8, cols: u8) -> impl Strategy<Value = Occupant> {
    prop_oneof![
        arb_space(rows, cols).prop_map(|space| Occupant::Room { space }),
        arb_space(rows, cols).prop_map(|space| Occupant::Field { space }),
        arb_space(rows, cols).prop_map(|space| Occupant::Stable { space }),
        proptest::collection::vec(arb_group(rows, cols), 1..3)
            .prop_map(|groups| Occupant::Pastures { groups }),
    ]
}

/// A sequence of occupants to place one after another.
pub fn arb_placements(rows: u8, cols: u8, max_len: usize) -> impl Strategy<Value = Vec<Occupant>> {
    proptest::collection::vec(arb_occupant(rows, cols), 0..max_len)
}

/// Any resource.
pub fn arb_resource() -> impl Strategy<Value = Resource> {
    proptest::sample::select(Resource::ALL.to_vec())
}

/// A resource map with entries in `-max..=max`.
pub fn arb_resource_map(max: i32) -> impl Strategy<Value = ResourceMap> {
    proptest::collection::vec((arb_resource(), -max..=max), 0..5).prop_map(|entries| {
        entries
            .into_iter()
            .fold(ResourceMap::new(), |map, (resource, amount)| {
                map.with(resource, amount)
            })
    })
}

/// A resource map with entries in `0..=max`.
pub fn arb_goods(max: i32) -> impl Strategy<Value = ResourceMap> {
    proptest::collection::vec((arb_resource(), 0..=max), 0..5).prop_map(|entries| {
        entries
            .into_iter()
            .fold(ResourceMap::new(), |map, (resource, amount)| {
                map.with(resource, amount)
            })
    })
}

/// Up to six capacity slots.
pub fn arb_slots() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(1u32..9, 0..=6)
}

/// Sheep, boar and cattle counts.
pub fn arb_herd() -> impl Strategy<Value = [u32; 3]> {
    [0u32..10, 0u32..10, 0u32..10]
}

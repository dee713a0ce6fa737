//! Property tests for the ledger, the board, candidate filters and the
//! capacity solver.

use std::collections::BTreeSet;

use agricola_core::actions::ActionKind;
use agricola_core::board::{boundary, is_connected, Board, Occupant, OccupantKind, Space};
use agricola_core::cards::{CardCatalogue, CardDef, CardId, CardKind};
use agricola_core::choice::ResourceCandidate;
use agricola_core::events::{fire_filters, Effect, GameEvent, TriggerContext};
use agricola_core::husbandry::can_hold;
use agricola_core::player::Player;
use agricola_core::resources::{Ledger, Resource, ResourceMap};
use agricola_test_utils::fixtures::{player_with, standard_board, started_game};
use agricola_test_utils::oracle::brute_force_can_hold;
use agricola_test_utils::strategies::{
    arb_goods, arb_herd, arb_placements, arb_resource_map, arb_slots,
};
use proptest::prelude::*;

// ============================================================================
// Ledger
// ============================================================================

proptest! {
    #[test]
    fn ledger_commits_fully_or_not_at_all(
        initial in arb_goods(6),
        cost in arb_goods(6),
        prereq in arb_goods(3),
        change in arb_resource_map(6),
    ) {
        let mut ledger = Ledger::new(initial.clone());
        let before = ledger.clone();
        match ledger.apply(&cost, &prereq, &change) {
            Err(_) => prop_assert_eq!(ledger, before),
            Ok(receipt) => {
                for resource in Resource::ALL {
                    prop_assert!(ledger.get(resource) >= 0);
                    let mut expected = initial.get(resource) - cost.get(resource) + change.get(resource);
                    if resource == Resource::Food {
                        expected += receipt.begged as i32;
                    }
                    prop_assert_eq!(ledger.get(resource), expected);
                }
                prop_assert_eq!(ledger.begging(), receipt.begged);
            }
        }
    }

    #[test]
    fn non_food_shortfalls_always_fail(initial in arb_goods(4), cost in arb_goods(8)) {
        let short = cost
            .iter()
            .any(|(resource, amount)| resource != Resource::Food && initial.get(resource) < amount);
        let mut ledger = Ledger::new(initial);
        prop_assert_eq!(ledger.pay(&cost).is_err(), short);
    }
}

// ============================================================================
// Board
// ============================================================================

fn spaces_of(board: &Board, kind: OccupantKind) -> BTreeSet<Space> {
    board
        .spaces()
        .filter(|space| board.occupant_at(*space) == Some(kind))
        .collect()
}

proptest! {
    #[test]
    fn placements_keep_board_invariants(occupants in arb_placements(3, 5, 24)) {
        let mut board = standard_board();
        for occupant in occupants {
            let before = board.clone();
            if board.place(occupant).is_err() {
                prop_assert_eq!(&board, &before);
                continue;
            }

            prop_assert!(is_connected(board.rooms()));
            let fields: BTreeSet<Space> = board.fields().map(|field| field.space).collect();
            prop_assert!(is_connected(&fields));
            let fenced: BTreeSet<Space> = board
                .pastures()
                .iter()
                .flat_map(|pasture| pasture.spaces().iter().copied())
                .collect();
            prop_assert!(is_connected(&fenced));

            // Every space has at most one main occupant.
            let total: usize = board.pastures().iter().map(|p| p.size()).sum();
            prop_assert_eq!(total, fenced.len());
            prop_assert!(board.rooms().iter().all(|s| !fields.contains(s) && !fenced.contains(s)));
            prop_assert!(fields.iter().all(|s| !fenced.contains(s)));
            prop_assert!(board
                .stables()
                .iter()
                .all(|s| !board.rooms().contains(s) && !fields.contains(s)));
            prop_assert!(board
                .rooms()
                .iter()
                .chain(board.stables())
                .chain(&fields)
                .chain(&fenced)
                .all(|s| board.in_bounds(*s)));
            prop_assert_eq!(spaces_of(&board, OccupantKind::Room), board.rooms().clone());

            let expected: BTreeSet<_> = board.pastures().iter().flat_map(|p| boundary(p.spaces())).collect();
            prop_assert_eq!(board.fences(), expected);
        }
    }
}

#[test]
fn adjacent_pasture_only_pays_for_new_fences() {
    let mut player: Player = player_with(&[(Resource::Wood, 20)]);
    let first = player
        .build_pastures(vec![vec![Space::new(0, 2)]])
        .unwrap();
    assert_eq!(first, 4);

    // Shares one edge with the first pasture.
    let second = player
        .build_pastures(vec![vec![Space::new(0, 3)]])
        .unwrap();
    assert_eq!(second, 3);
    assert_eq!(player.ledger.get(Resource::Wood), 13);
    assert_eq!(player.ledger.get(Resource::FencesAvailable), 8);
    assert_eq!(player.board.fences().len(), 7);
}

#[test]
fn fencing_two_pastures_at_once_shares_the_middle_fence() {
    let single = |space| {
        let mut player = player_with(&[(Resource::Wood, 20)]);
        player.build_pastures(vec![vec![space]]).unwrap()
    };
    let first = single(Space::new(0, 2));
    let second = single(Space::new(0, 4));
    assert_eq!((first, second), (4, 4));

    let mut player = player_with(&[(Resource::Wood, 20)]);
    let built = player
        .build_pastures(vec![vec![Space::new(0, 2)], vec![Space::new(0, 3)]])
        .unwrap();
    assert!(built < first + second);
    assert_eq!(built, 7);
    assert_eq!(player.ledger.get(Resource::Wood), 20 - built as i32);
}

#[test]
fn fences_are_not_charged_when_the_layout_is_rejected() {
    let mut player = player_with(&[(Resource::Wood, 20)]);
    let err = player.build_pastures(vec![vec![Space::new(0, 2), Space::new(2, 4)]]);
    assert!(err.is_err());
    assert_eq!(player.ledger.get(Resource::Wood), 20);
    assert!(player.board.pastures().is_empty());
}

// ============================================================================
// Candidate filters
// ============================================================================

fn with_food_variant(
    _: &TriggerContext<'_>,
    candidates: Vec<ResourceCandidate>,
) -> Vec<ResourceCandidate> {
    let mut out = candidates.clone();
    out.extend(candidates.into_iter().map(|candidate| {
        candidate
            .gaining(&ResourceMap::of(Resource::Food, 1))
            .from_card("Forager")
    }));
    out
}

fn with_grain_variant(
    _: &TriggerContext<'_>,
    candidates: Vec<ResourceCandidate>,
) -> Vec<ResourceCandidate> {
    let mut out = candidates.clone();
    if let Some(first) = candidates.first() {
        out.push(
            first
                .clone()
                .gaining(&ResourceMap::of(Resource::Grain, 1))
                .from_card("Gleaner"),
        );
    }
    out
}

/// Standard cards plus two occupations that only ever append variants.
fn catalogue_with_appenders() -> CardCatalogue {
    let mut catalogue = CardCatalogue::standard();
    catalogue.register(
        CardDef::new("Forager", CardKind::Occupation)
            .listens(&[GameEvent::Action(ActionKind::Forest)])
            .with_trigger(|_| Ok(Effect::Rewrite(with_food_variant))),
    );
    catalogue.register(
        CardDef::new("Gleaner", CardKind::Occupation)
            .listens(&[GameEvent::Action(ActionKind::Forest)])
            .with_trigger(|_| Ok(Effect::Rewrite(with_grain_variant))),
    );
    catalogue
}

proptest! {
    #[test]
    fn appending_filters_keep_the_baseline(
        wood in 0i32..8,
        food in 0i32..3,
        cards in proptest::sample::subsequence(vec!["MushroomCollector", "Forager", "Gleaner"], 0..=3),
    ) {
        let catalogue = catalogue_with_appenders();
        let mut game = started_game(2, 11);
        let state = game.state_mut();
        for card in &cards {
            let id = CardId::from(*card);
            state.players[0].hand_occupations.push(id.clone());
            state.play_card(&catalogue, 0, &id, &ResourceMap::new()).unwrap();
        }

        let baseline = vec![ResourceCandidate::new(
            ResourceMap::of(Resource::Wood, wood).with(Resource::Food, food),
        )];
        let filtered = fire_filters(
            state,
            &catalogue,
            GameEvent::Action(ActionKind::Forest),
            0,
            baseline.clone(),
        )
        .unwrap();

        if cards.is_empty() {
            prop_assert_eq!(filtered, baseline);
        } else {
            prop_assert!(filtered.len() >= baseline.len());
            for candidate in &baseline {
                prop_assert!(filtered.contains(candidate));
            }
        }
    }
}

#[test]
fn forest_without_cards_offers_only_the_stock() {
    let game = started_game(2, 11);
    let baseline = vec![ResourceCandidate::new(ResourceMap::of(Resource::Wood, 3))];
    let filtered = fire_filters(
        game.state(),
        game.catalogue(),
        GameEvent::Action(ActionKind::Forest),
        0,
        baseline.clone(),
    )
    .unwrap();
    assert_eq!(filtered, baseline);
}

// ============================================================================
// Capacity
// ============================================================================

proptest! {
    #[test]
    fn solver_matches_brute_force(slots in arb_slots(), herd in arb_herd()) {
        prop_assert_eq!(can_hold(&slots, &herd), brute_force_can_hold(&slots, &herd));
    }

    #[test]
    fn more_room_never_hurts(slots in arb_slots(), herd in arb_herd(), extra in 1u32..6) {
        if can_hold(&slots, &herd) {
            let mut bigger = slots.clone();
            bigger.push(extra);
            prop_assert!(can_hold(&bigger, &herd));
        }
    }
}

#[test]
fn house_pet_holds_one_animal_on_a_bare_farm() {
    let board = standard_board();
    assert!(board.can_hold(&ResourceMap::of(Resource::Cattle, 1)));
    assert!(!board.can_hold(&ResourceMap::of(Resource::Cattle, 2)));
    assert!(!board.can_hold(
        &ResourceMap::of(Resource::Cattle, 1).with(Resource::Sheep, 1)
    ));
}

#[test]
fn stable_inside_pasture_doubles_it() {
    let mut board = standard_board();
    board
        .place(Occupant::Pastures {
            groups: vec![vec![Space::new(0, 1)]],
        })
        .unwrap();
    assert!(board.can_hold(&ResourceMap::of(Resource::Sheep, 3)));
    assert!(!board.can_hold(&ResourceMap::of(Resource::Sheep, 4)));
    board
        .place(Occupant::Stable {
            space: Space::new(0, 1),
        })
        .unwrap();
    assert!(board.can_hold(&ResourceMap::of(Resource::Sheep, 5)));
}

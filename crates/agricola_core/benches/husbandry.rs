//! Animal capacity benchmarks.
//!
//! Run with: `cargo bench -p agricola_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use agricola_core::board::{Board, Occupant, Space};
use agricola_core::husbandry::{can_hold, capacity_slots};
use agricola_core::resources::{Resource, ResourceMap};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// A crowded farm: three pastures, two of them with stables, plus a free
/// stable.
fn crowded_board() -> Board {
    let mut board = Board::starting(3, 5, &[Space::new(0, 0), Space::new(1, 0)]);
    for space in [Space::new(0, 2), Space::new(1, 4), Space::new(2, 0)] {
        board
            .place(Occupant::Stable { space })
            .expect("stable fits");
    }
    board
        .place(Occupant::Pastures {
            groups: vec![
                vec![Space::new(0, 1), Space::new(0, 2)],
                vec![Space::new(0, 3), Space::new(0, 4)],
                vec![Space::new(1, 3), Space::new(1, 4)],
            ],
        })
        .expect("pastures fit");
    board
}

/// Runs capacity packing benchmarks.
pub fn husbandry_benchmark(c: &mut Criterion) {
    let board = crowded_board();
    let slots = capacity_slots(&board);

    c.bench_function("can_hold_fits", |b| {
        b.iter(|| can_hold(black_box(&slots), black_box(&[4, 3, 2])))
    });

    c.bench_function("can_hold_overflows", |b| {
        b.iter(|| can_hold(black_box(&slots), black_box(&[7, 7, 7])))
    });

    let herd = ResourceMap::of(Resource::Sheep, 4)
        .with(Resource::Boar, 4)
        .with(Resource::Cattle, 3);
    c.bench_function("board_can_hold", |b| {
        b.iter(|| black_box(&board).can_hold(black_box(&herd)))
    });
}

criterion_group!(benches, husbandry_benchmark);
criterion_main!(benches);

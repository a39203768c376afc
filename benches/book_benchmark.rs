//! Benchmarks for book-side operations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use depthfeed::book::{BookSide, Side};
use depthfeed::parser::PriceLevel;
use rust_decimal::Decimal;
use std::str::FromStr;

fn populate_levels(count: usize) -> Vec<PriceLevel> {
    (0..count)
        .map(|i| PriceLevel {
            price: Decimal::from(50_000 - i as i64),
            quantity: Decimal::from_str("1.5").unwrap(),
        })
        .collect()
}

fn mixed_delta() -> Vec<PriceLevel> {
    vec![
        PriceLevel {
            price: Decimal::from(49_999),
            quantity: Decimal::ZERO,
        },
        PriceLevel {
            price: Decimal::from(49_998),
            quantity: Decimal::from_str("2.0").unwrap(),
        },
        PriceLevel {
            price: Decimal::from(50_100),
            quantity: Decimal::from_str("0.75").unwrap(),
        },
    ]
}

fn benchmark_apply_delta(c: &mut Criterion) {
    let seed = populate_levels(500);
    let delta = mixed_delta();

    c.bench_function("apply_delta_on_500_levels", |b| {
        let mut side = BookSide::new();
        side.apply_delta(&seed);
        b.iter(|| {
            side.apply_delta(black_box(&delta));
        })
    });
}

fn benchmark_ranked_view(c: &mut Criterion) {
    let seed = populate_levels(500);
    let mut side = BookSide::new();
    side.apply_delta(&seed);

    c.bench_function("ranked_view_500_levels", |b| {
        b.iter(|| {
            black_box(side.ranked(Side::Bid));
        })
    });
}

criterion_group!(benches, benchmark_apply_delta, benchmark_ranked_view);
criterion_main!(benches);

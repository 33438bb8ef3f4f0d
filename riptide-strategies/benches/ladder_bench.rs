//! Benchmark: quote ladder derivation
//!
//! Measures the hot path the quoting engine runs on every source-book
//! update: turning a fair value into up to `max_quote_levels` target
//! price/quantity pairs per side (§4.4). This is pure arithmetic with no
//! locking or I/O, so it should stay in the tens-of-nanoseconds range per
//! side even at the largest configured ladder depth.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use riptide_core::config::{FvModel, HitLogic, QuotingParameters};
use riptide_core::core::{Price, Quantity, Side};
use riptide_strategies::quoting::derive_side_ladder;
use rust_decimal_macros::dec;
use std::time::Duration;

fn params(max_quote_levels: usize) -> QuotingParameters {
    QuotingParameters {
        instrument_id: 1,
        source_instrument_id: 2,
        book_name: "bench".into(),
        fv_model: FvModel::Mid,
        hit_logic: HitLogic::AllowAll,
        spread_bp: dec!(10),
        skew_bp_per_unit: dec!(0.5),
        level_step_bp: dec!(5),
        max_quote_levels,
        quote_size: Quantity::from_decimal(dec!(1)),
        requote_threshold_bp: dec!(2),
        throttle_window: Duration::from_secs(60),
        max_fill_qty_per_window: Quantity::from_decimal(dec!(100)),
        expected_update_interval_ms: None,
    }
}

fn bench_single_level_ladder(c: &mut Criterion) {
    let mut group = c.benchmark_group("ladder");
    group.significance_level(0.01).sample_size(10_000);

    let p = params(1);
    let fv = Price::from_decimal(dec!(50000));
    let tick = Price::from_decimal(dec!(0.01));
    let lot = Quantity::from_decimal(dec!(0.001));

    group.bench_function("single_level_no_cross", |b| {
        b.iter(|| {
            black_box(derive_side_ladder(
                black_box(fv),
                black_box(Side::Buy),
                black_box(dec!(5)),
                black_box(&p),
                black_box(tick),
                black_box(lot),
                black_box(None),
            ));
        });
    });

    group.finish();
}

fn bench_deep_ladder_with_no_cross_clamp(c: &mut Criterion) {
    let mut group = c.benchmark_group("ladder");
    group.significance_level(0.01).sample_size(10_000);

    let mut p = params(10);
    p.hit_logic = HitLogic::NoCross;
    let fv = Price::from_decimal(dec!(50000));
    let tick = Price::from_decimal(dec!(0.01));
    let lot = Quantity::from_decimal(dec!(0.001));
    let opposite = Price::from_decimal(dec!(50001));

    group.bench_function("ten_levels_no_cross", |b| {
        b.iter(|| {
            black_box(derive_side_ladder(
                black_box(fv),
                black_box(Side::Sell),
                black_box(dec!(-3)),
                black_box(&p),
                black_box(tick),
                black_box(lot),
                black_box(Some(opposite)),
            ));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_single_level_ladder, bench_deep_ladder_with_no_cross_clamp);
criterion_main!(benches);

//! Benchmark: fixed-point arithmetic
//!
//! Purpose: measure the overhead of `Price`/`Quantity` checked arithmetic
//! and tick-quantization, since both sit on every hot path that touches a
//! price or a fill (ladder derivation, the ledger, the hedger's notional
//! conversion).
//! Target: single-digit nanoseconds per op; this is scalar integer math
//! with at most one i128 intermediate.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use riptide_core::core::{Price, Quantity};
use rust_decimal_macros::dec;

fn bench_checked_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_point");
    group.significance_level(0.01).sample_size(10_000);

    let a = Price::from_decimal(dec!(50000));
    let b = Price::from_decimal(dec!(0.01));

    group.bench_function("price_add", |b_| {
        b_.iter(|| black_box(black_box(a) + black_box(b)));
    });

    group.finish();
}

fn bench_mul_fp(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_point");
    group.significance_level(0.01).sample_size(10_000);

    let price = Price::from_decimal(dec!(50000));
    let qty = Quantity::from_decimal(dec!(1.5));

    group.bench_function("price_mul_qty", |b| {
        b.iter(|| black_box(black_box(price).checked_mul_qty(black_box(qty))));
    });

    group.finish();
}

fn bench_round_to_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_point");
    group.significance_level(0.01).sample_size(10_000);

    let tick = Price::from_decimal(dec!(0.01));
    let price = Price::from_decimal(dec!(50000.0149));

    group.bench_function("round_down_to_tick", |b| {
        b.iter(|| black_box(black_box(price).round_down_to(black_box(tick))));
    });
    group.bench_function("round_up_to_tick", |b| {
        b.iter(|| black_box(black_box(price).round_up_to(black_box(tick))));
    });

    group.finish();
}

fn bench_decimal_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_point");
    group.significance_level(0.01).sample_size(10_000);

    group.bench_function("from_decimal", |b| {
        b.iter(|| black_box(Price::from_decimal(black_box(dec!(50000.12345678)))));
    });

    let price = Price::from_decimal(dec!(50000.12345678));
    group.bench_function("to_decimal", |b| {
        b.iter(|| black_box(black_box(price).to_decimal()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_checked_add,
    bench_mul_fp,
    bench_round_to_tick,
    bench_decimal_round_trip,
);
criterion_main!(benches);

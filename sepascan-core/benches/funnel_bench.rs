//! Criterion benchmarks for SepaScan hot paths.
//!
//! Benchmarks:
//! 1. Indicator computation (full IndicatorSet over a daily series)
//! 2. RS batch (Phase A scores + Phase B percentile ratings)
//! 3. Pattern detection over the trailing window
//! 4. Full funnel evaluation for one technically qualified symbol

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;

use sepascan_core::config::ScreenerConfig;
use sepascan_core::domain::PriceSeries;
use sepascan_core::fundamentals::{FundamentalSnapshot, StaticFundamentals};
use sepascan_core::indicators::IndicatorSet;
use sepascan_core::rs::{rs_ratings, rs_score};
use sepascan_core::synthetic;
use sepascan_core::{patterns, Funnel};

fn passing_snapshot() -> FundamentalSnapshot {
    FundamentalSnapshot {
        earnings_growth: Some(0.45),
        revenue_growth: Some(0.30),
        roe: Some(0.28),
        market_cap: Some(10e9),
        shares_outstanding: Some(150e6),
        float_shares: Some(80e6),
        net_income: Some(1.2e9),
        sector: Some("Technology".into()),
        industry: Some("Software".into()),
    }
}

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_set");

    for &bar_count in &[252, 504, 1260] {
        let bars = synthetic::leader_series(bar_count);
        group.bench_with_input(
            BenchmarkId::new("compute", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| IndicatorSet::compute(black_box(&bars)));
            },
        );
    }

    group.finish();
}

fn bench_rs_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("rs_batch");

    for &universe_size in &[50, 200, 500] {
        // A mixed universe: leaders, laggards, and choppy names.
        let scores: HashMap<String, f64> = (0..universe_size)
            .map(|i| {
                let bars = match i % 3 {
                    0 => synthetic::leader_series(300),
                    1 => synthetic::laggard_series(300),
                    _ => synthetic::choppy_series(300),
                };
                (format!("SYM{i}"), rs_score(&bars).unwrap_or(0.0))
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("ratings", universe_size),
            &universe_size,
            |b, _| {
                b.iter(|| rs_ratings(black_box(&scores)));
            },
        );
    }

    group.finish();
}

fn bench_pattern_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_detect");

    let cfg = ScreenerConfig::default();
    let bars = synthetic::leader_series(300);
    let indicators = IndicatorSet::compute(&bars);

    group.bench_function("leader_300_bars", |b| {
        b.iter(|| patterns::detect(black_box(&bars), black_box(&indicators), &cfg.pattern));
    });

    let quiet = synthetic::laggard_series(300);
    let quiet_ind = IndicatorSet::compute(&quiet);
    group.bench_function("context_gate_early_exit", |b| {
        b.iter(|| patterns::detect(black_box(&quiet), black_box(&quiet_ind), &cfg.pattern));
    });

    group.finish();
}

fn bench_funnel(c: &mut Criterion) {
    let mut group = c.benchmark_group("funnel_evaluate");

    let cfg = ScreenerConfig::default();
    let funnel = Funnel::new(&cfg);
    let source = StaticFundamentals::default().with("LEAD", passing_snapshot());

    let leader = PriceSeries::new("LEAD", synthetic::leader_series(300)).unwrap();
    group.bench_function("qualified_leader", |b| {
        b.iter(|| funnel.evaluate(black_box(&leader), Some(92.0), &source));
    });

    let laggard = PriceSeries::new("LAG", synthetic::laggard_series(300)).unwrap();
    group.bench_function("early_reject_downtrend", |b| {
        b.iter(|| funnel.evaluate(black_box(&laggard), Some(10.0), &source));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_indicators,
    bench_rs_batch,
    bench_pattern_detection,
    bench_funnel,
);
criterion_main!(benches);

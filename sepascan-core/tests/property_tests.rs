//! Property-based tests for the numeric core: RS ratings, the composite
//! scorer, rolling indicators and cache freshness.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use sepascan_core::config::ScreenerConfig;
use sepascan_core::fundamentals::{CacheEntry, FundamentalSnapshot, GateFlags};
use sepascan_core::indicators::sma;
use sepascan_core::patterns::PatternEvidence;
use sepascan_core::rs::rs_ratings;
use sepascan_core::score::{composite_score, EntrySignal};
use sepascan_core::synthetic;
use sepascan_core::StageLabel;

fn score_map(scores: Vec<f64>) -> HashMap<String, f64> {
    scores
        .into_iter()
        .enumerate()
        .map(|(i, s)| (format!("SYM{i}"), s))
        .collect()
}

fn entry_signal_strategy() -> impl Strategy<Value = EntrySignal> {
    prop_oneof![
        Just(EntrySignal::PivotPoint),
        Just(EntrySignal::PatternSetup),
        Just(EntrySignal::Ma50Bounce),
        Just(EntrySignal::Ma21Bounce),
        Just(EntrySignal::Extended),
        Just(EntrySignal::Consolidating),
    ]
}

fn stage_strategy() -> impl Strategy<Value = StageLabel> {
    prop_oneof![
        Just(StageLabel::InsufficientData),
        Just(StageLabel::Stage1Or3),
        Just(StageLabel::Stage4Decline),
        Just(StageLabel::Stage2Developing),
        Just(StageLabel::Stage2Uptrend),
    ]
}

fn pattern_with_score(score: u32) -> PatternEvidence {
    PatternEvidence {
        pattern_score: score,
        ..PatternEvidence::default()
    }
}

proptest! {
    #[test]
    fn rs_ratings_stay_in_range(scores in prop::collection::vec(-5.0f64..5.0, 1..100)) {
        let map = score_map(scores);
        let ratings = rs_ratings(&map);
        prop_assert_eq!(ratings.len(), map.len());
        for rating in ratings.values() {
            prop_assert!((0.0..=100.0).contains(rating));
        }
    }

    #[test]
    fn rs_ratings_are_idempotent(scores in prop::collection::vec(-5.0f64..5.0, 1..60)) {
        let map = score_map(scores);
        let first = rs_ratings(&map);
        let second = rs_ratings(&map);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn rs_rating_is_monotonic_in_score(scores in prop::collection::vec(-5.0f64..5.0, 2..60)) {
        let map = score_map(scores);
        let ratings = rs_ratings(&map);
        for (a, &score_a) in &map {
            for (b, &score_b) in &map {
                if score_a < score_b {
                    prop_assert!(ratings[a] <= ratings[b]);
                }
            }
        }
    }

    #[test]
    fn composite_score_is_clamped(
        stage in stage_strategy(),
        rs in prop::option::of(0.0f64..100.0),
        pattern_score in 0u32..=9,
        off_high in prop::option::of(0.0f64..1.0),
        accel in any::<bool>(),
        strong in any::<bool>(),
        signal in entry_signal_strategy(),
    ) {
        let cfg = ScreenerConfig::default();
        let flags = GateFlags {
            earnings_acceleration: accel,
            roe_strong: strong,
            institutional_score: 6,
        };
        let score = composite_score(
            stage,
            rs,
            &pattern_with_score(pattern_score),
            off_high,
            Some(&flags),
            signal,
            &cfg,
        );
        prop_assert!((0.0..=100.0).contains(&score), "score={score}");
    }

    #[test]
    fn composite_score_monotonic_in_rs(
        rs_lo in 0.0f64..100.0,
        rs_hi in 0.0f64..100.0,
        pattern_score in 0u32..=9,
        signal in entry_signal_strategy(),
    ) {
        prop_assume!(rs_lo <= rs_hi);
        let cfg = ScreenerConfig::default();
        let pattern = pattern_with_score(pattern_score);
        let lo = composite_score(
            StageLabel::Stage2Uptrend, Some(rs_lo), &pattern, Some(0.10), None, signal, &cfg,
        );
        let hi = composite_score(
            StageLabel::Stage2Uptrend, Some(rs_hi), &pattern, Some(0.10), None, signal, &cfg,
        );
        prop_assert!(lo <= hi);
    }

    #[test]
    fn composite_score_monotonic_in_high_proximity(
        off_near in 0.0f64..0.25,
        off_far in 0.0f64..0.25,
    ) {
        prop_assume!(off_near <= off_far);
        let cfg = ScreenerConfig::default();
        let pattern = pattern_with_score(5);
        let near = composite_score(
            StageLabel::Stage2Uptrend, Some(80.0), &pattern, Some(off_near),
            None, EntrySignal::Consolidating, &cfg,
        );
        let far = composite_score(
            StageLabel::Stage2Uptrend, Some(80.0), &pattern, Some(off_far),
            None, EntrySignal::Consolidating, &cfg,
        );
        prop_assert!(near >= far);
    }

    #[test]
    fn sma_matches_window_mean(
        closes in prop::collection::vec(1.0f64..1000.0, 1..80),
        period in 1usize..20,
    ) {
        let bars = synthetic::series_from_closes(&closes, 1_000);
        let result = sma(&bars, period);
        prop_assert_eq!(result.len(), bars.len());
        for (i, &value) in result.iter().enumerate() {
            if i + 1 < period {
                prop_assert!(value.is_nan());
            } else {
                let mean: f64 =
                    closes[i + 1 - period..=i].iter().sum::<f64>() / period as f64;
                prop_assert!((value - mean).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn cache_entry_freshness_boundaries(
        ttl_hours in 1i64..24 * 30,
        age_hours in 0i64..24 * 60,
    ) {
        let now = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let entry = entry_at(now - Duration::hours(age_hours), None);
        let fresh = entry.is_fresh(now, Duration::hours(ttl_hours));
        prop_assert_eq!(fresh, age_hours < ttl_hours);
    }

    #[test]
    fn elapsed_earnings_date_invalidates_within_ttl(days_past in 0i64..30) {
        let now = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        // Written moments ago with a generous TTL, but earnings already hit.
        let entry = entry_at(now, Some(now.date() - Duration::days(days_past)));
        prop_assert!(!entry.is_fresh(now, Duration::days(365)));
    }
}

fn entry_at(timestamp: NaiveDateTime, next_earnings_date: Option<NaiveDate>) -> CacheEntry {
    CacheEntry {
        symbol: "TEST".into(),
        timestamp,
        data: FundamentalSnapshot::default(),
        next_earnings_date,
    }
}

//! Relative strength — blended momentum score and universe-wide percentile.
//!
//! Two phases. Phase A produces a per-symbol weighted blend of trailing
//! returns and can run per symbol in isolation (embarrassingly parallel).
//! Phase B converts the full batch of scores into percentile ratings and
//! only makes sense over the whole universe at once: adding or removing a
//! symbol shifts everyone else's rating, so callers must never rate
//! incrementally.

use std::collections::HashMap;

use crate::domain::PriceBar;

/// Trailing return horizons in bars (~3/6/9/12 months).
pub const RS_HORIZONS: [usize; 4] = [63, 126, 189, 252];

/// Blend weights, favoring the shortest horizon.
pub const RS_WEIGHTS: [f64; 4] = [0.4, 0.2, 0.2, 0.2];

/// Minimum history for a symbol to participate in Phase A.
pub const RS_MIN_BARS: usize = 252;

/// Phase A: blended momentum score for one symbol.
///
/// Returns None for symbols with fewer than 252 bars — they carry no rating
/// and downstream filters requiring a minimum rating hard-fail on them.
/// Horizons the series cannot cover contribute 0 to the blend.
pub fn rs_score(bars: &[PriceBar]) -> Option<f64> {
    if bars.len() < RS_MIN_BARS {
        return None;
    }
    let last = bars[bars.len() - 1].close;
    let mut score = 0.0;
    for (&horizon, &weight) in RS_HORIZONS.iter().zip(RS_WEIGHTS.iter()) {
        if bars.len() < horizon {
            continue;
        }
        let past = bars[bars.len() - horizon].close;
        if past > 0.0 {
            score += weight * (last - past) / past;
        }
    }
    Some(score)
}

/// Phase B: percentile ratings over one batch of Phase-A scores.
///
/// Ties get the average of the ranks they span, ratings scale to [0, 100]
/// and round to one decimal. Deterministic: the same score set always
/// produces identical ratings.
pub fn rs_ratings(scores: &HashMap<String, f64>) -> HashMap<String, f64> {
    let n = scores.len();
    if n == 0 {
        return HashMap::new();
    }
    if n == 1 {
        let symbol = scores.keys().next().cloned().unwrap_or_default();
        return HashMap::from([(symbol, 100.0)]);
    }

    let mut ordered: Vec<(&String, f64)> = scores.iter().map(|(s, &v)| (s, v)).collect();
    ordered.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ratings = HashMap::with_capacity(n);
    let mut i = 0;
    while i < n {
        // Find the run of tied scores starting at i
        let mut j = i + 1;
        while j < n && ordered[j].1 == ordered[i].1 {
            j += 1;
        }
        // 0-based average rank for the tie group
        let avg_rank = (i + j - 1) as f64 / 2.0;
        let rating = avg_rank / (n - 1) as f64 * 100.0;
        let rounded = (rating * 10.0).round() / 10.0;
        for entry in &ordered[i..j] {
            ratings.insert(entry.0.clone(), rounded);
        }
        i = j;
    }

    ratings
}

//! Deterministic synthetic series for tests, benches, and offline smoke runs.
//!
//! Each builder produces a price history with a known funnel outcome:
//! - `leader_series`: long uptrend into a tight, dried-up base → Stage 2 pass
//! - `strong_leader_series`: shallow uptrend hugging its high, below the
//!   generic 52-week-low floor → exercises the strong-leader exception
//! - `pullback_series`: uptrend that slipped under MA50 → Stage 2 developing
//! - `laggard_series`: persistent decline → Stage 4
//! - `flat_series`: sideways tape → Stage 1/3
//! - `choppy_series`: wide-range churn near its high → no pattern

use chrono::{Duration, NaiveDate};

use crate::domain::PriceBar;

const BASE_DATE: (i32, u32, u32) = (2024, 6, 3);
const RISE_VOLUME: u64 = 1_000_000;
const UP_DAY_VOLUME: u64 = 500_000;
const DOWN_DAY_VOLUME: u64 = 300_000;
const POCKET_PIVOT_VOLUME: u64 = 450_000;

/// Consolidation tape: 20 closes as offsets around the base level, tight
/// enough for the pivot check, alternating with an up-day volume edge and a
/// pocket pivot on the final bar.
const BASE_OFFSETS: [f64; 20] = [
    -0.30, -0.50, -0.20, -0.40, -0.10, -0.30, 0.00, -0.15, 0.10, -0.05, 0.15, 0.00, 0.20, 0.05,
    -0.05, 0.05, -0.02, 0.06, 0.02, 0.10,
];

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(BASE_DATE.0, BASE_DATE.1, BASE_DATE.2).unwrap()
}

fn bars_from_closes(closes: &[f64], volumes: &[u64], pad: f64) -> Vec<PriceBar> {
    let date0 = start_date();
    closes
        .iter()
        .zip(volumes.iter())
        .enumerate()
        .map(|(i, (&close, &volume))| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: date0 + Duration::days(i as i64),
                open,
                high: open.max(close) + pad,
                low: open.min(close) - pad,
                close,
                volume,
            }
        })
        .collect()
}

/// Linear rise into a 20-bar tight base. With `n >= 252` the result clears
/// every technical funnel gate and carries a pivot-grade pattern.
pub fn leader_series(n: usize) -> Vec<PriceBar> {
    trending_base(n, 50.0, 99.5, None)
}

/// Shallow rise ending ~3% below a spike high, so the close sits under the
/// generic 30%-above-low floor while staying inside the leader band.
pub fn strong_leader_series(n: usize) -> Vec<PriceBar> {
    trending_base(n, 99.0, 113.0, Some(116.5))
}

/// Uptrend whose last 20 bars fade below MA50 (but not MA150/MA200).
pub fn pullback_series(n: usize) -> Vec<PriceBar> {
    let rise_len = n.saturating_sub(20).max(1);
    let mut closes: Vec<f64> = (0..rise_len)
        .map(|i| interp(50.0, 99.5, i, rise_len))
        .collect();
    let fade_len = n - rise_len;
    for i in 0..fade_len {
        closes.push(99.5 - 4.0 * (i + 1) as f64 / fade_len as f64);
    }
    let volumes = vec![900_000u64; n];
    bars_from_closes(&closes, &volumes, 0.15)
}

/// Persistent decline from 150 to 60.
pub fn laggard_series(n: usize) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..n).map(|i| interp(150.0, 60.0, i, n)).collect();
    let volumes = vec![800_000u64; n];
    bars_from_closes(&closes, &volumes, 0.15)
}

/// Flat tape at 100.
pub fn flat_series(n: usize) -> Vec<PriceBar> {
    let closes = vec![100.0; n];
    let volumes = vec![700_000u64; n];
    bars_from_closes(&closes, &volumes, 0.15)
}

/// Wide-range churn between roughly 96 and 104 — near its high but never
/// tightening.
pub fn choppy_series(n: usize) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| 100.0 + ((i * 37) % 17) as f64 * 0.5 - 4.0)
        .collect();
    let volumes = vec![900_000u64; n];
    bars_from_closes(&closes, &volumes, 0.15)
}

/// Bars from explicit closes with one flat volume, for ad hoc shapes the
/// named builders don't cover.
pub fn series_from_closes(closes: &[f64], volume: u64) -> Vec<PriceBar> {
    let volumes = vec![volume; closes.len()];
    bars_from_closes(closes, &volumes, 0.15)
}

fn interp(from: f64, to: f64, i: usize, len: usize) -> f64 {
    if len <= 1 {
        return to;
    }
    from + (to - from) * i as f64 / (len - 1) as f64
}

/// Shared builder: linear rise, then the 20-bar base around `rise_to + 0.5`,
/// optionally with a single spike high planted shortly before the base.
fn trending_base(n: usize, rise_from: f64, rise_to: f64, spike_high: Option<f64>) -> Vec<PriceBar> {
    if n <= BASE_OFFSETS.len() {
        let closes: Vec<f64> = (0..n).map(|i| interp(rise_from, rise_to, i, n)).collect();
        let volumes = vec![RISE_VOLUME; n];
        return bars_from_closes(&closes, &volumes, 0.15);
    }

    let rise_len = n - BASE_OFFSETS.len();
    let base_level = rise_to + 0.5;

    let mut closes: Vec<f64> = (0..rise_len)
        .map(|i| interp(rise_from, rise_to, i, rise_len))
        .collect();
    let mut volumes = vec![RISE_VOLUME; rise_len];

    for (i, offset) in BASE_OFFSETS.iter().enumerate() {
        let close = base_level + offset;
        let prev = *closes.last().unwrap_or(&base_level);
        let volume = if i == BASE_OFFSETS.len() - 1 {
            POCKET_PIVOT_VOLUME
        } else if close > prev {
            UP_DAY_VOLUME
        } else {
            DOWN_DAY_VOLUME
        };
        closes.push(close);
        volumes.push(volume);
    }

    let mut bars = bars_from_closes(&closes, &volumes, 0.15);

    if let Some(high) = spike_high {
        // Plant the spike outside the short tightening window but inside the
        // 52-week window. A series too short to hold the spike goes without.
        if let Some(idx) = n.checked_sub(25) {
            bars[idx].high = high;
        }
    }

    bars
}

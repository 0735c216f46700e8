//! Fundamental gate — ordered growth/quality checks over a snapshot.
//!
//! Checks short-circuit on the first failure and always return a tagged
//! outcome: a rejection carries its reason, a pass carries the flags the
//! scorer consumes. Missing data fails the check that needs it, with one
//! exception: unknown net income is tolerated, only an explicit non-positive
//! figure is the hard reject.

use serde::{Deserialize, Serialize};

use super::snapshot::FundamentalSnapshot;
use crate::config::FundamentalConfig;
use crate::patterns::PatternEvidence;

/// Flags extracted from a passing snapshot, consumed by the composite scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateFlags {
    pub earnings_acceleration: bool,
    pub roe_strong: bool,
    pub institutional_score: u8,
}

/// Outcome of the fundamental gate. Never a bare absence: a reject always
/// names the failed check.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Rejected { reason: String },
    Passed(GateFlags),
}

impl GateOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, GateOutcome::Passed(_))
    }
}

/// Evaluate the gate for one symbol.
///
/// `pattern` supplies the accumulation evidence for the institutional
/// composite; `avg_dollar_volume` is the 50-day average volume times price.
pub fn evaluate(
    snapshot: &FundamentalSnapshot,
    pattern: &PatternEvidence,
    avg_dollar_volume: Option<f64>,
    cfg: &FundamentalConfig,
) -> GateOutcome {
    if let Some(net_income) = snapshot.net_income {
        if net_income <= 0.0 {
            return GateOutcome::Rejected {
                reason: format!("non-positive net income ({net_income:.0})"),
            };
        }
    }

    let earnings = match snapshot.earnings_growth {
        Some(v) => v,
        None => {
            return GateOutcome::Rejected {
                reason: "earnings growth unavailable".into(),
            }
        }
    };
    if earnings < cfg.min_earnings_growth {
        return GateOutcome::Rejected {
            reason: format!(
                "earnings growth {:.1}% below {:.1}% minimum",
                earnings * 100.0,
                cfg.min_earnings_growth * 100.0
            ),
        };
    }

    let roe = match snapshot.roe {
        Some(v) => v,
        None => {
            return GateOutcome::Rejected {
                reason: "ROE unavailable".into(),
            }
        }
    };
    if roe < cfg.min_roe {
        return GateOutcome::Rejected {
            reason: format!(
                "ROE {:.1}% below {:.1}% minimum",
                roe * 100.0,
                cfg.min_roe * 100.0
            ),
        };
    }

    let revenue = match snapshot.revenue_growth {
        Some(v) => v,
        None => {
            return GateOutcome::Rejected {
                reason: "revenue growth unavailable".into(),
            }
        }
    };
    let classic_growth = revenue >= cfg.min_revenue_growth;
    let exceptional_earnings = earnings >= cfg.exceptional_earnings_growth
        && revenue >= cfg.exceptional_min_revenue_growth;
    if !classic_growth && !exceptional_earnings {
        return GateOutcome::Rejected {
            reason: format!(
                "revenue growth {:.1}% below {:.1}% minimum (no exceptional-earnings exception)",
                revenue * 100.0,
                cfg.min_revenue_growth * 100.0
            ),
        };
    }

    let institutional = institutional_score(snapshot, pattern, avg_dollar_volume, cfg);
    if institutional < cfg.min_institutional_score {
        return GateOutcome::Rejected {
            reason: format!(
                "institutional score {institutional}/8 below {} minimum",
                cfg.min_institutional_score
            ),
        };
    }

    GateOutcome::Passed(GateFlags {
        earnings_acceleration: earnings >= cfg.exceptional_earnings_growth,
        roe_strong: roe >= cfg.strong_roe,
        institutional_score: institutional,
    })
}

/// Institutional-ownership/liquidity composite, 0-8.
///
/// Sum of five independent sub-scores:
/// - accumulation evidence (0-2): full for detected accumulation, half for
///   supply drying up
/// - market-cap banding (0-2): full inside the sweet spot, half inside the
///   outer band
/// - float-lockup ratio banding (0-2): full when float/shares is tight,
///   half when moderate
/// - dollar-volume liquidity floor (0-1)
/// - shares-outstanding ceiling preference (0-1)
pub fn institutional_score(
    snapshot: &FundamentalSnapshot,
    pattern: &PatternEvidence,
    avg_dollar_volume: Option<f64>,
    cfg: &FundamentalConfig,
) -> u8 {
    let mut score = 0u8;

    if pattern.institutional_accumulation {
        score += 2;
    } else if pattern.volume_dry_up {
        score += 1;
    }

    if let Some(mcap) = snapshot.market_cap {
        if mcap >= cfg.mcap_sweet_spot_min && mcap <= cfg.mcap_sweet_spot_max {
            score += 2;
        } else if mcap >= cfg.mcap_outer_min && mcap <= cfg.mcap_outer_max {
            score += 1;
        }
    }

    if let (Some(float), Some(shares)) = (snapshot.float_shares, snapshot.shares_outstanding) {
        if shares > 0.0 {
            let ratio = float / shares;
            if ratio <= cfg.float_ratio_tight {
                score += 2;
            } else if ratio <= cfg.float_ratio_loose {
                score += 1;
            }
        }
    }

    if avg_dollar_volume.is_some_and(|v| v >= cfg.min_dollar_volume) {
        score += 1;
    }

    if snapshot
        .shares_outstanding
        .is_some_and(|s| s <= cfg.max_shares_outstanding)
    {
        score += 1;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulating_pattern() -> PatternEvidence {
        PatternEvidence {
            institutional_accumulation: true,
            volume_dry_up: true,
            ..Default::default()
        }
    }

    fn strong_snapshot() -> FundamentalSnapshot {
        FundamentalSnapshot {
            earnings_growth: Some(0.45),
            revenue_growth: Some(0.22),
            roe: Some(0.30),
            market_cap: Some(10e9),
            shares_outstanding: Some(120e6),
            float_shares: Some(60e6),
            net_income: Some(500e6),
            sector: Some("Technology".into()),
            industry: Some("Software".into()),
        }
    }

    #[test]
    fn strong_snapshot_passes_with_flags() {
        let cfg = FundamentalConfig::default();
        let outcome = evaluate(
            &strong_snapshot(),
            &accumulating_pattern(),
            Some(20e6),
            &cfg,
        );
        match outcome {
            GateOutcome::Passed(flags) => {
                assert!(flags.earnings_acceleration);
                assert!(flags.roe_strong);
                assert_eq!(flags.institutional_score, 8);
            }
            GateOutcome::Rejected { reason } => panic!("unexpected reject: {reason}"),
        }
    }

    #[test]
    fn negative_net_income_is_a_hard_reject() {
        let mut snap = strong_snapshot();
        snap.net_income = Some(-50_000.0);
        let outcome = evaluate(
            &snap,
            &accumulating_pattern(),
            Some(20e6),
            &FundamentalConfig::default(),
        );
        match outcome {
            GateOutcome::Rejected { reason } => assert!(reason.contains("net income")),
            GateOutcome::Passed(_) => panic!("negative net income must not pass"),
        }
    }

    #[test]
    fn unknown_net_income_is_tolerated() {
        let mut snap = strong_snapshot();
        snap.net_income = None;
        let outcome = evaluate(
            &snap,
            &accumulating_pattern(),
            Some(20e6),
            &FundamentalConfig::default(),
        );
        assert!(outcome.passed());
    }

    #[test]
    fn missing_earnings_growth_fails() {
        let mut snap = strong_snapshot();
        snap.earnings_growth = None;
        let outcome = evaluate(
            &snap,
            &accumulating_pattern(),
            Some(20e6),
            &FundamentalConfig::default(),
        );
        assert!(!outcome.passed());
    }

    #[test]
    fn exceptional_earnings_path_relaxes_revenue_floor() {
        let mut snap = strong_snapshot();
        snap.earnings_growth = Some(0.50);
        snap.revenue_growth = Some(0.12); // below 20%, above the 10% exception floor
        let outcome = evaluate(
            &snap,
            &accumulating_pattern(),
            Some(20e6),
            &FundamentalConfig::default(),
        );
        assert!(outcome.passed());
    }

    #[test]
    fn weak_revenue_without_exception_fails() {
        let mut snap = strong_snapshot();
        snap.earnings_growth = Some(0.30); // below the 40% exception bar
        snap.revenue_growth = Some(0.12);
        let outcome = evaluate(
            &snap,
            &accumulating_pattern(),
            Some(20e6),
            &FundamentalConfig::default(),
        );
        match outcome {
            GateOutcome::Rejected { reason } => assert!(reason.contains("revenue")),
            GateOutcome::Passed(_) => panic!("should fail the growth check"),
        }
    }

    #[test]
    fn both_growth_paths_require_roe() {
        let mut snap = strong_snapshot();
        snap.roe = Some(0.10);
        let outcome = evaluate(
            &snap,
            &accumulating_pattern(),
            Some(20e6),
            &FundamentalConfig::default(),
        );
        match outcome {
            GateOutcome::Rejected { reason } => assert!(reason.contains("ROE")),
            GateOutcome::Passed(_) => panic!("low ROE must not pass"),
        }
    }

    #[test]
    fn institutional_score_is_sum_of_sub_scores() {
        let cfg = FundamentalConfig::default();
        let snap = strong_snapshot();
        let pattern = accumulating_pattern();

        // All bands maximized → 2+2+2+1+1 = 8
        assert_eq!(institutional_score(&snap, &pattern, Some(20e6), &cfg), 8);

        // Drop one band at a time and watch the sum fall by exactly that band.
        let mut no_acc = pattern;
        no_acc.institutional_accumulation = false;
        no_acc.volume_dry_up = false;
        assert_eq!(institutional_score(&snap, &no_acc, Some(20e6), &cfg), 6);

        let mut outer_mcap = snap.clone();
        outer_mcap.market_cap = Some(500e6); // outer band → 1 instead of 2
        assert_eq!(
            institutional_score(&outer_mcap, &pattern, Some(20e6), &cfg),
            7
        );

        let mut illiquid = snap.clone();
        illiquid.shares_outstanding = Some(500e6); // over ceiling, float ratio now 60/500 still tight
        assert_eq!(institutional_score(&illiquid, &pattern, Some(20e6), &cfg), 7);

        assert_eq!(institutional_score(&snap, &pattern, Some(1e6), &cfg), 7);
    }

    #[test]
    fn institutional_gate_blocks_low_composite() {
        let cfg = FundamentalConfig::default();
        let mut snap = strong_snapshot();
        snap.market_cap = Some(50e6); // below outer band
        snap.float_shares = Some(110e6); // ratio ~0.92, no band
        let outcome = evaluate(&snap, &PatternEvidence::default(), Some(1e6), &cfg);
        match outcome {
            GateOutcome::Rejected { reason } => assert!(reason.contains("institutional")),
            GateOutcome::Passed(_) => panic!("composite of 1 must not pass"),
        }
    }
}

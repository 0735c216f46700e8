//! The screening funnel: a strictly ordered, early-exit gate pipeline.
//!
//! Gates run cheapest first. History length, then the long-term trend
//! template, then the MA hierarchy, the 52-week position, the RS rating and
//! the pattern gate. Only a symbol that clears every technical gate triggers
//! the fundamental lookup, which is the one expensive call in the pipeline.
//!
//! Every evaluation, pass or reject, produces a full `FunnelResult` with a
//! single dominant reason and a best-effort partial score, so rejected
//! symbols stay rankable and inspectable instead of vanishing.

use serde::{Deserialize, Serialize};

use crate::config::ScreenerConfig;
use crate::domain::PriceSeries;
use crate::fundamentals::{gate, FundamentalSource, GateFlags};
use crate::patterns::{self, PatternEvidence};
use crate::score::{self, EntrySignal};

/// Weinstein-style trend stage, plus the two non-stage terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageLabel {
    InsufficientData,
    Stage1Or3,
    Stage4Decline,
    Stage2Developing,
    Stage2Uptrend,
    Error,
}

impl std::fmt::Display for StageLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StageLabel::InsufficientData => "Insufficient Data",
            StageLabel::Stage1Or3 => "Stage 1/3 (Base/Top)",
            StageLabel::Stage4Decline => "Stage 4 (Decline)",
            StageLabel::Stage2Developing => "Stage 2 (Developing)",
            StageLabel::Stage2Uptrend => "Stage 2 (Uptrend)",
            StageLabel::Error => "Error",
        };
        f.write_str(s)
    }
}

/// One symbol's complete funnel verdict. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelResult {
    pub symbol: String,
    pub stage: StageLabel,
    pub passes: bool,
    pub reason: String,
    pub rs_rating: Option<f64>,
    pub pattern: PatternEvidence,
    pub entry_signal: EntrySignal,
    pub is_extended: bool,
    pub composite_score: f64,
    pub fundamental_flags: Option<GateFlags>,
    pub current_price: f64,
    pub pct_off_high: Option<f64>,
    pub pct_above_low: Option<f64>,
}

impl FunnelResult {
    fn insufficient_data(symbol: &str, bars: usize, needed: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            stage: StageLabel::InsufficientData,
            passes: false,
            reason: format!("only {bars} bars of history, {needed} required"),
            rs_rating: None,
            pattern: PatternEvidence::default(),
            entry_signal: EntrySignal::Consolidating,
            is_extended: false,
            composite_score: 0.0,
            fundamental_flags: None,
            current_price: 0.0,
            pct_off_high: None,
            pct_above_low: None,
        }
    }

    /// Symbol-level computation failure. The run continues without it.
    pub fn error(symbol: &str, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.to_string(),
            stage: StageLabel::Error,
            passes: false,
            reason: reason.into(),
            rs_rating: None,
            pattern: PatternEvidence::default(),
            entry_signal: EntrySignal::Consolidating,
            is_extended: false,
            composite_score: 0.0,
            fundamental_flags: None,
            current_price: 0.0,
            pct_off_high: None,
            pct_above_low: None,
        }
    }
}

/// Everything computed before the gates run, reused by every exit path.
struct Technicals {
    close: f64,
    pattern: PatternEvidence,
    entry_signal: EntrySignal,
    is_extended: bool,
    pct_off_high: Option<f64>,
    pct_above_low: Option<f64>,
}

/// The funnel itself. Stateless beyond its configuration; one instance
/// serves arbitrarily many evaluations, concurrently.
pub struct Funnel<'a> {
    cfg: &'a ScreenerConfig,
}

impl<'a> Funnel<'a> {
    pub fn new(cfg: &'a ScreenerConfig) -> Self {
        Self { cfg }
    }

    /// Run one symbol through the pipeline.
    ///
    /// `rs_rating` comes from the batch-wide RS computation; `None` means
    /// the symbol had no rating, which fails the RS gate. `fundamentals` is
    /// consulted only after every technical gate has passed.
    pub fn evaluate(
        &self,
        series: &PriceSeries,
        rs_rating: Option<f64>,
        fundamentals: &dyn FundamentalSource,
    ) -> FunnelResult {
        let trend = &self.cfg.trend;
        if series.len() < trend.min_history_bars {
            return FunnelResult::insufficient_data(
                series.symbol(),
                series.len(),
                trend.min_history_bars,
            );
        }

        let ind = series.indicators();
        let close = series.last_close();

        // With min_history_bars of history every indicator is defined; a
        // missing one here means corrupt input.
        let (Some(ma50), Some(ma150), Some(ma200)) =
            (ind.ma_now(50), ind.ma_now(150), ind.ma_now(200))
        else {
            return FunnelResult::error(series.symbol(), "moving averages undefined");
        };
        let Some(ma200_rising) = ind.ma_rising(200, trend.ma200_trend_span) else {
            return FunnelResult::error(series.symbol(), "MA200 slope undefined");
        };

        let pattern = patterns::detect(series.bars(), ind, &self.cfg.pattern);
        let tech = Technicals {
            close,
            pattern,
            entry_signal: score::entry_signal(series.bars(), ind, &pattern, &self.cfg.entry),
            is_extended: score::is_extended(close, ind, &self.cfg.entry),
            pct_off_high: series.pct_off_high(),
            pct_above_low: series.pct_above_low(),
        };

        // Gate 2: long-term trend template.
        if close <= ma150 || close <= ma200 || ma150 <= ma200 || !ma200_rising {
            let stage = if close < ma150 && close < ma200 && !ma200_rising {
                StageLabel::Stage4Decline
            } else {
                StageLabel::Stage1Or3
            };
            let reason = if !ma200_rising {
                "MA200 not trending up over the last month".to_string()
            } else if ma150 <= ma200 {
                "MA150 below MA200".to_string()
            } else {
                "price below long-term moving averages".to_string()
            };
            return self.finish(series, stage, false, reason, rs_rating, tech, None);
        }

        // Gate 3: MA hierarchy.
        if close <= ma50 || ma50 <= ma150 {
            return self.finish(
                series,
                StageLabel::Stage2Developing,
                false,
                "MA hierarchy broken: need price > MA50 > MA150 > MA200".to_string(),
                rs_rating,
                tech,
                None,
            );
        }

        // Gate 4: 52-week position.
        let (Some(off_high), Some(above_low)) = (tech.pct_off_high, tech.pct_above_low) else {
            return FunnelResult::error(series.symbol(), "52-week extremes undefined");
        };
        if off_high > trend.max_pct_below_high {
            return self.finish(
                series,
                StageLabel::Stage2Developing,
                false,
                format!(
                    "{:.1}% below 52-week high, limit {:.0}%",
                    off_high * 100.0,
                    trend.max_pct_below_high * 100.0
                ),
                rs_rating,
                tech,
                None,
            );
        }
        let strong_leader = off_high < trend.leader_max_pct_off_high
            && rs_rating.is_some_and(|rs| rs >= trend.leader_min_rs_rating);
        if above_low < trend.min_pct_above_low && !strong_leader {
            return self.finish(
                series,
                StageLabel::Stage2Developing,
                false,
                format!(
                    "only {:.1}% above 52-week low, floor {:.0}%",
                    above_low * 100.0,
                    trend.min_pct_above_low * 100.0
                ),
                rs_rating,
                tech,
                None,
            );
        }

        // Gate 5: relative strength.
        let Some(rs) = rs_rating else {
            return self.finish(
                series,
                StageLabel::Stage2Developing,
                false,
                "RS rating unavailable".to_string(),
                rs_rating,
                tech,
                None,
            );
        };
        if rs < trend.min_rs_rating {
            return self.finish(
                series,
                StageLabel::Stage2Developing,
                false,
                format!("RS rating {rs:.1} below {:.0} minimum", trend.min_rs_rating),
                rs_rating,
                tech,
                None,
            );
        }

        // Gate 6: pattern quality.
        if tech.pattern.pattern_score < self.cfg.pattern.min_pattern_score {
            return self.finish(
                series,
                StageLabel::Stage2Developing,
                false,
                format!(
                    "pattern score {} below {} minimum",
                    tech.pattern.pattern_score, self.cfg.pattern.min_pattern_score
                ),
                rs_rating,
                tech,
                None,
            );
        }

        // Technically qualified. Only now pay for the fundamental lookup.
        let Some(snapshot) = fundamentals.fundamentals(series.symbol()) else {
            return self.finish(
                series,
                StageLabel::Stage2Uptrend,
                false,
                "fundamentals unavailable".to_string(),
                rs_rating,
                tech,
                None,
            );
        };
        let avg_dollar_volume = ind.avg_volume_50d.map(|v| v * close);
        match gate::evaluate(&snapshot, &tech.pattern, avg_dollar_volume, &self.cfg.fundamentals) {
            gate::GateOutcome::Rejected { reason } => self.finish(
                series,
                StageLabel::Stage2Uptrend,
                false,
                reason,
                rs_rating,
                tech,
                None,
            ),
            gate::GateOutcome::Passed(flags) => self.finish(
                series,
                StageLabel::Stage2Uptrend,
                true,
                "passes all criteria".to_string(),
                rs_rating,
                tech,
                Some(flags),
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        series: &PriceSeries,
        stage: StageLabel,
        passes: bool,
        reason: String,
        rs_rating: Option<f64>,
        tech: Technicals,
        flags: Option<GateFlags>,
    ) -> FunnelResult {
        let composite_score = score::composite_score(
            stage,
            rs_rating,
            &tech.pattern,
            tech.pct_off_high,
            flags.as_ref(),
            tech.entry_signal,
            self.cfg,
        );
        FunnelResult {
            symbol: series.symbol().to_string(),
            stage,
            passes,
            reason,
            rs_rating,
            pattern: tech.pattern,
            entry_signal: tech.entry_signal,
            is_extended: tech.is_extended,
            composite_score,
            fundamental_flags: flags,
            current_price: tech.close,
            pct_off_high: tech.pct_off_high,
            pct_above_low: tech.pct_above_low,
        }
    }
}

//! Fundamental snapshot — one symbol's provider-sourced financial picture.

use serde::{Deserialize, Serialize};

/// Point-in-time fundamentals for one symbol.
///
/// Every field is optional: providers routinely omit items, and the gate
/// decides per check whether a missing value passes or fails. Growth and
/// ROE values are YoY fractions (0.25 = 25%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub earnings_growth: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub roe: Option<f64>,
    pub market_cap: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub float_shares: Option<f64>,
    pub net_income: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

//! Yahoo Finance providers.
//!
//! Price history comes from the v8 chart API, fundamentals from the v10
//! quoteSummary API. Yahoo has no official API and both endpoints change
//! format without notice, so parsing is defensive and every missing piece
//! maps to a typed `FetchError`.

use std::time::Duration;

use serde::Deserialize;

use super::provider::{FetchError, FundamentalFetch, FundamentalProvider, PriceProvider};
use crate::domain::{PriceBar, PriceSeries};
use crate::fundamentals::FundamentalSnapshot;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

fn build_client() -> Result<reqwest::blocking::Client, FetchError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FetchError::Network(e.to_string()))
}

fn classify_status(status: reqwest::StatusCode, symbol: &str, retry_after: Option<u64>) -> FetchError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status == reqwest::StatusCode::FORBIDDEN {
        FetchError::RateLimited {
            retry_after_secs: retry_after,
        }
    } else if status == reqwest::StatusCode::NOT_FOUND {
        FetchError::SymbolNotFound {
            symbol: symbol.to_string(),
        }
    } else {
        FetchError::Network(format!("HTTP {status} for {symbol}"))
    }
}

fn retry_after_secs(resp: &reqwest::blocking::Response) -> Option<u64> {
    resp.headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

fn send_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Price history (v8 chart API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartOuter,
}

#[derive(Debug, Deserialize)]
struct ChartOuter {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Daily OHLCV history from Yahoo's chart endpoint.
pub struct YahooPrices {
    client: reqwest::blocking::Client,
}

impl YahooPrices {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client()?,
        })
    }

    fn chart_url(symbol: &str, lookback_days: u32) -> String {
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?range={lookback_days}d&interval=1d"
        )
    }

    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<PriceBar>, FetchError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                FetchError::MalformedResponse(format!("{}: {}", err.code, err.description))
            }
            None => FetchError::MalformedResponse("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::MalformedResponse("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| FetchError::MissingField("timestamp".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::MissingField("indicators.quote".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| FetchError::MalformedResponse(format!("invalid timestamp: {ts}")))?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Null rows are holidays and halts, skip them.
            let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) else {
                continue;
            };

            bars.push(PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume: volume.unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(bars)
    }
}

impl PriceProvider for YahooPrices {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn history(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries, FetchError> {
        let url = Self::chart_url(symbol, lookback_days);
        let resp = self.client.get(&url).send().map_err(send_error)?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(&resp);
            return Err(classify_status(status, symbol, retry_after));
        }

        let chart: ChartResponse = resp
            .json()
            .map_err(|e| FetchError::MalformedResponse(format!("chart response: {e}")))?;
        let bars = Self::parse_response(symbol, chart)?;

        PriceSeries::new(symbol, bars).map_err(|e| FetchError::MalformedResponse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Fundamentals (v10 quoteSummary API)
// ---------------------------------------------------------------------------

/// Yahoo wraps most numbers as `{"raw": 1.23, "fmt": "1.23"}`.
#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

impl RawValue {
    fn value(opt: Option<RawValue>) -> Option<f64> {
        opt.and_then(|v| v.raw)
    }
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryOuter,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryOuter {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<QuoteSummaryError>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryError {
    code: String,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteSummaryResult {
    #[serde(rename = "defaultKeyStatistics")]
    key_statistics: Option<KeyStatistics>,
    #[serde(rename = "financialData")]
    financial_data: Option<FinancialData>,
    #[serde(rename = "summaryProfile")]
    summary_profile: Option<SummaryProfile>,
    #[serde(rename = "calendarEvents")]
    calendar_events: Option<CalendarEvents>,
    price: Option<PriceModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KeyStatistics {
    #[serde(rename = "sharesOutstanding")]
    shares_outstanding: Option<RawValue>,
    #[serde(rename = "floatShares")]
    float_shares: Option<RawValue>,
    #[serde(rename = "netIncomeToCommon")]
    net_income: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FinancialData {
    #[serde(rename = "earningsGrowth")]
    earnings_growth: Option<RawValue>,
    #[serde(rename = "revenueGrowth")]
    revenue_growth: Option<RawValue>,
    #[serde(rename = "returnOnEquity")]
    return_on_equity: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryProfile {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CalendarEvents {
    earnings: Option<EarningsCalendar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EarningsCalendar {
    #[serde(rename = "earningsDate")]
    earnings_date: Vec<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PriceModule {
    #[serde(rename = "marketCap")]
    market_cap: Option<RawValue>,
}

/// Fundamental snapshot provider over Yahoo's quoteSummary endpoint.
pub struct YahooFundamentals {
    client: reqwest::blocking::Client,
}

impl YahooFundamentals {
    const MODULES: &'static str =
        "defaultKeyStatistics,financialData,summaryProfile,calendarEvents,price";

    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client()?,
        })
    }

    fn summary_url(symbol: &str) -> String {
        format!(
            "https://query2.finance.yahoo.com/v10/finance/quoteSummary/{symbol}\
             ?modules={}",
            Self::MODULES
        )
    }

    fn parse_response(symbol: &str, resp: QuoteSummaryResponse) -> Result<FundamentalFetch, FetchError> {
        let result = resp
            .quote_summary
            .result
            .ok_or_else(|| match resp.quote_summary.error {
                Some(err) if err.code == "Not Found" => FetchError::SymbolNotFound {
                    symbol: symbol.to_string(),
                },
                Some(err) => {
                    FetchError::MalformedResponse(format!("{}: {}", err.code, err.description))
                }
                None => FetchError::MalformedResponse("empty result with no error".into()),
            })?;

        let modules = result
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::MalformedResponse("result array is empty".into()))?;

        let stats = modules.key_statistics.unwrap_or_default();
        let financial = modules.financial_data.unwrap_or_default();
        let profile = modules.summary_profile.unwrap_or_default();
        let price = modules.price.unwrap_or_default();

        let next_earnings_date = modules
            .calendar_events
            .and_then(|c| c.earnings)
            .and_then(|e| e.earnings_date.into_iter().next())
            .and_then(|v| v.raw)
            .and_then(|ts| chrono::DateTime::from_timestamp(ts as i64, 0))
            .map(|dt| dt.naive_utc().date());

        let snapshot = FundamentalSnapshot {
            earnings_growth: RawValue::value(financial.earnings_growth),
            revenue_growth: RawValue::value(financial.revenue_growth),
            roe: RawValue::value(financial.return_on_equity),
            market_cap: RawValue::value(price.market_cap),
            shares_outstanding: RawValue::value(stats.shares_outstanding),
            float_shares: RawValue::value(stats.float_shares),
            net_income: RawValue::value(stats.net_income),
            sector: profile.sector,
            industry: profile.industry,
        };

        Ok(FundamentalFetch {
            snapshot,
            next_earnings_date,
        })
    }
}

impl FundamentalProvider for YahooFundamentals {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn snapshot(&self, symbol: &str) -> Result<FundamentalFetch, FetchError> {
        let url = Self::summary_url(symbol);
        let resp = self.client.get(&url).send().map_err(send_error)?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(&resp);
            return Err(classify_status(status, symbol, retry_after));
        }

        let summary: QuoteSummaryResponse = resp
            .json()
            .map_err(|e| FetchError::MalformedResponse(format!("quoteSummary response: {e}")))?;
        Self::parse_response(symbol, summary)
    }
}

//! External data access: provider traits and the Yahoo Finance
//! implementations for prices and fundamentals.

pub mod provider;
pub mod yahoo;

pub use provider::{FetchError, FundamentalFetch, FundamentalProvider, PriceProvider};
pub use yahoo::{YahooFundamentals, YahooPrices};

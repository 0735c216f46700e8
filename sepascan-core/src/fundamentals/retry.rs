//! Retry policy for the fundamental fetch path.
//!
//! Bounded attempts with exponential backoff, applied only to transient
//! failures. Permanent failures (bad symbol, malformed response) surface
//! immediately — retrying them would just burn the rate budget.

use std::time::Duration;

use crate::data::provider::FetchError;

/// Bounded exponential-backoff retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy with no sleeping, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// Backoff before the given retry (attempt numbering starts at 1; the
    /// first attempt has no delay).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.base_delay * 2u32.saturating_pow(attempt - 2)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub fn run<T>(
        &self,
        mut op: impl FnMut(u32) -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        let attempts = self.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }

            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }

        // attempts >= 1, so at least one error was recorded
        Err(last_err.unwrap_or(FetchError::Timeout))
    }
}

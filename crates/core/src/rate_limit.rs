//! Leaky-bucket rate limit tracking
//!
//! The Retail API reports its bucket after every response:
//! `x-ls-api-bucket-level: <used>/<size>` and `x-ls-api-drip-rate: <units/s>`.
//! Only the most recent response counts; nothing accumulates across requests.

use std::time::Duration;

use lightspeed_domain::{Result, RetailError};
use parking_lot::Mutex;

/// Bucket snapshot parsed from one response.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitState {
    pub used_units: f64,
    pub bucket_size: f64,
    /// Raw drip-rate header, validated when a wait has to be computed.
    pub drip_rate: Option<String>,
}

impl RateLimitState {
    /// Parse the bucket headers. Returns `None` when the bucket level is
    /// missing or malformed, which callers treat as an unlimited budget.
    #[must_use]
    pub fn from_headers(bucket_level: Option<&str>, drip_rate: Option<&str>) -> Option<Self> {
        let (used, size) = bucket_level?.split_once('/')?;
        let used_units = used.trim().parse::<f64>().ok()?;
        let bucket_size = size.trim().parse::<f64>().ok()?;
        Some(Self { used_units, bucket_size, drip_rate: drip_rate.map(|d| d.trim().to_string()) })
    }

    #[must_use]
    pub fn available_units(&self) -> f64 {
        self.bucket_size - self.used_units
    }

    /// Refill rate in units per second.
    ///
    /// # Errors
    /// Returns [`RetailError::RateLimit`] when the header is missing,
    /// non-numeric, or not positive.
    pub fn drip_rate_per_second(&self) -> Result<f64> {
        let raw = self
            .drip_rate
            .as_deref()
            .ok_or_else(|| RetailError::RateLimit("drip rate header missing".to_string()))?;
        match raw.parse::<f64>() {
            Ok(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
            _ => Err(RetailError::RateLimit(format!("invalid drip rate: {raw:?}"))),
        }
    }

    /// Delay required before spending `units`.
    ///
    /// # Errors
    /// Returns [`RetailError::RateLimit`] when a wait is needed but the drip
    /// rate is unusable.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn wait_for(&self, units: u32) -> Result<Duration> {
        let needed = f64::from(units);
        let available = self.available_units();
        if needed <= available {
            return Ok(Duration::ZERO);
        }

        let short = needed - available;
        let rate = self.drip_rate_per_second()?;
        let millis = (short / rate * 1000.0).ceil();
        Ok(Duration::from_millis(millis as u64))
    }
}

/// Holds the bucket snapshot of the most recent response.
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    last: Mutex<Option<RateLimitState>>,
}

impl RateLimitTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with the headers of the latest response.
    pub fn record(&self, bucket_level: Option<&str>, drip_rate: Option<&str>) {
        *self.last.lock() = RateLimitState::from_headers(bucket_level, drip_rate);
    }

    /// Delay to apply before a request costing `units`. Zero when no
    /// response has been seen yet.
    ///
    /// # Errors
    /// Propagates [`RateLimitState::wait_for`] errors.
    pub fn compute_wait(&self, units: u32) -> Result<Duration> {
        match self.last.lock().as_ref() {
            Some(state) => state.wait_for(units),
            None => Ok(Duration::ZERO),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<RateLimitState> {
        self.last.lock().clone()
    }
}

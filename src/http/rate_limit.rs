//! Rate limiting implementation
//!
//! Uses the governor crate for token bucket rate limiting. The page fetcher
//! waits on the limiter before every attempt, retries included.

use crate::error::{Error, Result};
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Configuration for rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second
    pub requests_per_second: u32,
    /// Burst size (max tokens in bucket)
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_burst() -> u32 {
    1
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// One request per interval, no burst
    pub fn per_second(requests_per_second: u32) -> Self {
        Self::new(requests_per_second, default_burst())
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    /// Create a new rate limiter; zero rates are rejected
    pub fn new(config: RateLimiterConfig) -> Result<Self> {
        let rate = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            Error::invalid_value("requests_per_second", "must be greater than zero")
        })?;
        let burst = NonZeroU32::new(config.burst_size)
            .ok_or_else(|| Error::invalid_value("burst_size", "must be greater than zero"))?;

        Ok(Self {
            limiter: Arc::new(Governor::direct(Quota::per_second(rate).allow_burst(burst))),
            config,
        })
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

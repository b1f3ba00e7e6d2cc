//! Retry policy
//!
//! `RetryState` tracks one fetch's attempts; `RetryPolicy::decide` turns that
//! state into the next wait and whether another attempt follows. Neither
//! touches the network or the clock.

use crate::error::Error;
use crate::types::BackoffType;
use std::time::Duration;

/// How many attempts a page gets and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per page; at least one attempt is always made
    pub max_attempts: u32,
    /// Base backoff unit
    pub unit: Duration,
    /// Backoff shape
    pub backoff: BackoffType,
    /// Upper bound on a single wait
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            unit: Duration::from_secs(1),
            backoff: BackoffType::Linear,
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    /// Linear policy with the given bound and unit
    pub fn new(max_attempts: u32, unit: Duration) -> Self {
        Self {
            max_attempts,
            unit,
            ..Self::default()
        }
    }

    /// Set the backoff shape
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffType) -> Self {
        self.backoff = backoff;
        self
    }

    /// Cap every wait at `max`
    #[must_use]
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.max_delay = Some(max);
        self
    }

    /// Wait after the given (1-based) failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.backoff {
            BackoffType::Constant => self.unit,
            BackoffType::Linear => self.unit.saturating_mul(attempt),
            BackoffType::Exponential => self
                .unit
                .saturating_mul(2u32.saturating_pow(attempt - 1)),
        };
        self.max_delay.map_or(delay, |cap| delay.min(cap))
    }

    /// Decide what follows the failure of the current attempt.
    ///
    /// The final failure still waits out its backoff before giving up.
    pub fn decide(&self, state: &RetryState) -> RetryDecision {
        let delay = self.delay_for(state.attempt());
        if state.attempt() >= self.max_attempts {
            RetryDecision::GiveUp { delay }
        } else {
            RetryDecision::Retry { delay }
        }
    }

    /// Total time spent waiting when every attempt fails
    pub fn total_backoff(&self) -> Duration {
        (1..=self.max_attempts.max(1))
            .map(|attempt| self.delay_for(attempt))
            .sum()
    }
}

/// Outcome of `RetryPolicy::decide`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then make another attempt
    Retry { delay: Duration },
    /// Wait, then report exhaustion
    GiveUp { delay: Duration },
}

impl RetryDecision {
    /// The wait attached to this decision
    pub fn delay(&self) -> Duration {
        match *self {
            Self::Retry { delay } | Self::GiveUp { delay } => delay,
        }
    }

    /// Check if another attempt follows
    pub fn should_retry(&self) -> bool {
        matches!(self, Self::Retry { .. })
    }
}

/// Attempt counter and last failure for one fetch
#[derive(Debug, Default)]
pub struct RetryState {
    attempt: u32,
    last_error: Option<Error>,
}

impl RetryState {
    /// Fresh state, no attempts made
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the next attempt and return its 1-based number
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    /// Number of the current (or last) attempt
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Remember the failure of the current attempt
    pub fn record_failure(&mut self, error: Error) {
        self.last_error = Some(error);
    }

    /// The most recent failure
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Convert into the error reported once attempts run out
    pub fn into_exhausted(self, cursor: &str) -> Error {
        Error::ExhaustedRetries {
            cursor: cursor.to_string(),
            attempts: self.attempt,
            last: Box::new(
                self.last_error
                    .unwrap_or_else(|| Error::Other("no attempt was made".to_string())),
            ),
        }
    }
}

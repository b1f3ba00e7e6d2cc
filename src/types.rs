//! Common types used throughout follower-ingest
//!
//! Shared enums that appear both in configuration and in the runtime
//! components they configure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Backoff Strategy
// ============================================================================

/// Shape of the delay between page fetch attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffType {
    /// Same delay after every failed attempt
    Constant,
    /// Attempt `n` waits `n` units
    #[default]
    Linear,
    /// Attempt `n` waits `2^(n-1)` units
    Exponential,
}

// ============================================================================
// Record Shape
// ============================================================================

/// Which record shape (and table layout) a deployment stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// Identifier, handle, display name, avatar and the two timestamps
    Minimal,
    /// Minimal plus viewer flags, serialized labels and description
    #[default]
    Extended,
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minimal => write!(f, "minimal"),
            Self::Extended => write!(f, "extended"),
        }
    }
}

impl FromStr for SchemaVariant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "extended" => Ok(Self::Extended),
            other => Err(format!("unknown schema variant '{other}'")),
        }
    }
}

// ============================================================================
// Log Level
// ============================================================================

/// Severity attached to pipeline events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Normal progress
    Info,
    /// A failure, retried or fatal
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

//! Error types for follower-ingest
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into three groups:
//! - attempt errors (`Transport`, `UpstreamStatus`, `UpstreamContent`, `Decode`),
//!   which the page fetcher retries and never lets escape on their own;
//! - run-fatal errors (`ExhaustedRetries`, `Persistence`, `Database`, `CursorLoop`,
//!   `PageLimit`, `State`), which stop the pagination driver;
//! - `Cancelled`, which is a clean stop rather than a failure.

use thiserror::Error;

/// The main error type for follower-ingest
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Page Attempt Errors (retryable)
    // ============================================================================
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Upstream returned HTTP {status}")]
    UpstreamStatus { status: u16 },

    #[error("Upstream returned markup instead of JSON (likely an error page)")]
    UpstreamContent,

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Run-Fatal Errors
    // ============================================================================
    #[error("Gave up on cursor '{cursor}' after {attempts} attempts: {last}")]
    ExhaustedRetries {
        cursor: String,
        attempts: u32,
        last: Box<Error>,
    },

    #[error("Failed to persist batch of {batch_size} (record {index}, id '{id}'): {message}")]
    Persistence {
        batch_size: usize,
        index: usize,
        id: String,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Upstream repeated cursor '{cursor}'")]
    CursorLoop { cursor: String },

    #[error("Stopped after reaching the page limit of {max_pages}")]
    PageLimit { max_pages: u64 },

    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // Control Flow
    // ============================================================================
    #[error("Cancelled")]
    Cancelled,

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Check if this error is retryable by re-fetching the same page
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. }
                | Error::UpstreamStatus { .. }
                | Error::UpstreamContent
                | Error::Decode { .. }
        )
    }

    /// Check if this error is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

/// Result type alias for follower-ingest
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::UpstreamStatus { status: 502 };
        assert_eq!(err.to_string(), "Upstream returned HTTP 502");

        let err = Error::ExhaustedRetries {
            cursor: "abc".to_string(),
            attempts: 5,
            last: Box::new(Error::UpstreamContent),
        };
        assert!(err.to_string().starts_with("Gave up on cursor 'abc' after 5 attempts"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::transport("connection reset").is_retryable());
        assert!(Error::UpstreamStatus { status: 500 }.is_retryable());
        assert!(Error::UpstreamStatus { status: 404 }.is_retryable());
        assert!(Error::UpstreamContent.is_retryable());
        assert!(Error::decode("expected object").is_retryable());

        assert!(!Error::Cancelled.is_retryable());
        assert!(!Error::config("test").is_retryable());
        assert!(!Error::state("disk full").is_retryable());
        assert!(!Error::ExhaustedRetries {
            cursor: String::new(),
            attempts: 1,
            last: Box::new(Error::UpstreamContent),
        }
        .is_retryable());
    }

    #[test]
    fn test_is_cancelled() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::UpstreamContent.is_cancelled());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}

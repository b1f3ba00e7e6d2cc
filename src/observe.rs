//! Pipeline observation
//!
//! Components report progress through an injected `Observer` instead of
//! logging to a global. Events are typed; each carries a level.
//!
//! The production observer, `TracingObserver`, forwards events to `tracing`
//! with structured fields. Whether they come out as text or JSON is decided
//! once, when the binary installs its `tracing-subscriber` formatter.

use crate::error::Error;
use crate::types::LogLevel;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{error, info};

/// Something that happened during a run
#[derive(Debug)]
pub enum Event<'a> {
    /// A page request is about to be sent
    FetchAttempt {
        cursor: &'a str,
        attempt: u32,
        url: &'a str,
    },
    /// A page attempt failed and will be waited out
    AttemptFailed {
        cursor: &'a str,
        attempt: u32,
        error: &'a Error,
        backoff: Duration,
    },
    /// A page was fetched and decoded
    PageFetched {
        cursor: &'a str,
        records: usize,
        next_cursor: Option<&'a str>,
    },
    /// A page's records were committed
    BatchCommitted {
        cursor: &'a str,
        records: usize,
        total: u64,
    },
    /// The driver moved on to a new cursor
    CursorAdvanced { cursor: &'a str },
    /// The collection was fully ingested
    Completed { records_written: u64, pages: u64 },
    /// The run stopped on cancellation
    Cancelled { resume_cursor: &'a str },
    /// The run stopped on a fatal error
    Failed {
        resume_cursor: &'a str,
        error: &'a Error,
    },
}

impl Event<'_> {
    /// Stable event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchAttempt { .. } => "fetch_attempt",
            Self::AttemptFailed { .. } => "attempt_failed",
            Self::PageFetched { .. } => "page_fetched",
            Self::BatchCommitted { .. } => "batch_committed",
            Self::CursorAdvanced { .. } => "cursor_advanced",
            Self::Completed { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }

    /// Severity of the event
    pub fn level(&self) -> LogLevel {
        match self {
            Self::AttemptFailed { .. } | Self::Failed { .. } => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// Receives pipeline events
pub trait Observer: Send + Sync {
    /// Handle one event
    fn observe(&self, event: &Event<'_>);
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, event: &Event<'_>) {
        let name = event.name();
        match *event {
            Event::FetchAttempt {
                cursor,
                attempt,
                url,
            } => info!(event = name, cursor, attempt, url, "Fetching page"),
            Event::AttemptFailed {
                cursor,
                attempt,
                error,
                backoff,
            } => error!(
                event = name,
                cursor,
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                error = %error,
                "Page attempt failed, backing off"
            ),
            Event::PageFetched {
                cursor,
                records,
                next_cursor,
            } => info!(
                event = name,
                cursor,
                records,
                next_cursor = next_cursor.unwrap_or_default(),
                "Fetched page"
            ),
            Event::BatchCommitted {
                cursor,
                records,
                total,
            } => info!(event = name, cursor, records, total, "Committed batch"),
            Event::CursorAdvanced { cursor } => info!(event = name, cursor, "Advanced cursor"),
            Event::Completed {
                records_written,
                pages,
            } => info!(
                event = name,
                records_written, pages, "All followers processed"
            ),
            Event::Cancelled { resume_cursor } => {
                info!(event = name, resume_cursor, "Run cancelled");
            }
            Event::Failed {
                resume_cursor,
                error,
            } => error!(event = name, resume_cursor, error = %error, "Run failed"),
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn observe(&self, _event: &Event<'_>) {}
}

/// An event as captured by `RecordingObserver`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Event name
    pub name: &'static str,
    /// Event level
    pub level: LogLevel,
}

/// Keeps the name and level of every event, in order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of the recorded events
    pub fn names(&self) -> Vec<&'static str> {
        self.events().into_iter().map(|e| e.name).collect()
    }

    /// Number of recorded events with the given name
    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name == name).count()
    }
}

impl Observer for RecordingObserver {
    fn observe(&self, event: &Event<'_>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedEvent {
                name: event.name(),
                level: event.level(),
            });
    }
}

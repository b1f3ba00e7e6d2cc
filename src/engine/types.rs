//! Engine types
//!
//! Run status, driver state and the report handed back to the caller.

use crate::error::Error;
use serde::Serialize;
use std::fmt;

/// Lifecycle of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Fetching and committing pages
    Running,
    /// Stopped on request; resumable from the reported cursor
    Cancelled,
    /// The whole collection was ingested
    Done,
    /// Stopped on a fatal error; resumable from the reported cursor
    Failed,
}

impl RunStatus {
    /// Check if the run can no longer change
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cancelled => "cancelled",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Driver progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineState {
    /// Cursor of the next page to fetch; every page before it is committed
    pub cursor: String,
    /// Records committed during this run
    pub records_written: u64,
    /// Pages committed during this run
    pub pages_committed: u64,
    /// Current status
    pub status: RunStatus,
}

impl PipelineState {
    /// Start a run at `cursor` (empty for the beginning)
    pub fn new(cursor: impl Into<String>) -> Self {
        Self {
            cursor: cursor.into(),
            records_written: 0,
            pages_committed: 0,
            status: RunStatus::Running,
        }
    }

    /// Account for one committed page
    pub fn record_commit(&mut self, records: usize) {
        self.records_written += records as u64;
        self.pages_committed += 1;
    }

    /// Move to the next page
    pub fn advance(&mut self, cursor: impl Into<String>) {
        self.cursor = cursor.into();
    }

    /// Enter a terminal status; a run that already ended keeps its status
    pub fn finish(&mut self, status: RunStatus) {
        if !self.status.is_terminal() {
            self.status = status;
        }
    }
}

/// Result of a pipeline run
#[derive(Debug)]
pub struct RunReport {
    /// Final driver state
    pub state: PipelineState,
    /// The fatal error, for `Failed` runs
    pub error: Option<Error>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    /// Final status
    pub fn status(&self) -> RunStatus {
        self.state.status
    }

    /// Cursor to pass back in to continue where this run stopped
    pub fn resume_cursor(&self) -> &str {
        &self.state.cursor
    }

    /// Check if the collection was fully ingested
    pub fn is_done(&self) -> bool {
        self.state.status == RunStatus::Done
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self.state.status {
            RunStatus::Done => 0,
            RunStatus::Cancelled => 130,
            RunStatus::Running | RunStatus::Failed => 1,
        }
    }
}

/// Driver limits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Stop with `PageLimit` after this many committed pages
    pub max_pages: Option<u64>,
}

impl PipelineConfig {
    /// Create a new config with no limits
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max pages
    #[must_use]
    pub fn with_max_pages(mut self, max: u64) -> Self {
        self.max_pages = Some(max);
        self
    }
}

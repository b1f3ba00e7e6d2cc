//! Checkpoint file contents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress saved after a committed page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Cursor of the next page to fetch
    #[serde(default)]
    pub cursor: String,

    /// Records written so far by the run that saved this checkpoint
    #[serde(default)]
    pub records_written: u64,

    /// Pages committed so far by the run that saved this checkpoint
    #[serde(default)]
    pub pages_committed: u64,

    /// When the checkpoint was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Checkpoint {
    /// Create a checkpoint stamped with the current time
    pub fn new(cursor: impl Into<String>, records_written: u64, pages_committed: u64) -> Self {
        Self {
            cursor: cursor.into(),
            records_written,
            pages_committed,
            updated_at: Some(Utc::now()),
        }
    }

    /// Check if the checkpoint carries a usable resume cursor
    pub fn is_resumable(&self) -> bool {
        !self.cursor.is_empty()
    }
}

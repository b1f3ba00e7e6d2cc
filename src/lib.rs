//! # follower-ingest
//!
//! Resumable, idempotent ingestion of a cursor-paginated follower list into
//! a local DuckDB table.
//!
//! ## Features
//!
//! - **Cursor pagination**: walks the upstream collection page by page until
//!   it reports no further cursor
//! - **Bounded retry**: transient failures (transport errors, non-2xx status,
//!   HTML error pages, undecodable bodies) are retried with linear backoff
//! - **Idempotent upsert**: each page is one transaction of
//!   `INSERT OR REPLACE` statements, so re-running a page is harmless
//! - **Cancellation**: SIGINT/SIGTERM stop the run between steps and report
//!   the cursor to resume from
//! - **Checkpoints**: optional state file for automatic resume
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use follower_ingest::cli::ingest_as;
//! use follower_ingest::config::IngestConfig;
//! use follower_ingest::record::FollowerProfile;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> follower_ingest::Result<()> {
//!     let config = IngestConfig::default();
//!     let report = ingest_as::<FollowerProfile>(&config, None, &CancellationToken::new()).await?;
//!     println!("{} records, resume at '{}'", report.state.records_written, report.resume_cursor());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Pipeline (engine)                       │
//! │   Running → Done | Cancelled | Failed      CancellationToken │
//! └──────────────────────────────────────────────────────────────┘
//!            │                     │                    │
//! ┌──────────┴─────────┐ ┌─────────┴────────┐ ┌─────────┴────────┐
//! │ PageFetcher (fetch)│ │ RecordStore      │ │ StateManager     │
//! │ RetryPolicy        │ │ (database)       │ │ (state)          │
//! │ PageDecoder        │ │ DuckDB upsert    │ │ JSON checkpoint  │
//! │ Transport (http)   │ │                  │ │                  │
//! └────────────────────┘ └──────────────────┘ └──────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types shared by config and runtime
pub mod types;

/// Follower records and pages
pub mod record;

/// Response decoding
pub mod decode;

/// HTTP transport and rate limiting
pub mod http;

/// Page fetching with retry
pub mod fetch;

/// Pipeline events and observers
pub mod observe;

/// DuckDB record store
pub mod database;

/// Resume checkpoints
pub mod state;

/// Pagination driver
pub mod engine;

/// YAML configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::IngestConfig;
pub use database::{RecordSink, RecordStore};
pub use engine::{Pipeline, PipelineState, RunReport, RunStatus};
pub use fetch::{PageFetcher, PageSource};
pub use record::{FollowerProfile, FollowerSummary, Page, Record};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

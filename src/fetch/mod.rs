//! Page fetch module
//!
//! Fetches one page per call, retrying transient failures with backoff.
//!
//! # Overview
//!
//! - `PageRequest` - builds the page URL from the endpoint and cursor
//! - `RetryPolicy` / `RetryState` - the retry decision, separate from I/O
//! - `PageFetcher` - transport + classification + retry loop
//! - `PageSource` - the seam the pagination driver fetches through
//!
//! Every attempt is classified as exactly one of transport failure,
//! non-success status, HTML instead of JSON, decode failure, or success.
//! The four failure classes are retried and only escape wrapped in
//! `Error::ExhaustedRetries`.

mod fetcher;
mod request;
mod retry;

pub use fetcher::{classify, PageFetcher, PageSource};
pub use request::PageRequest;
pub use retry::{RetryDecision, RetryPolicy, RetryState};

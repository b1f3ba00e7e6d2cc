//! Local follower store backed by DuckDB
//!
//! Every fetched page is applied as one transaction of `INSERT OR REPLACE`
//! statements keyed on the record id, so re-applying a page is harmless.

mod store;


pub use store::{validate_identifier, RecordSink, RecordStore, DEFAULT_TABLE};

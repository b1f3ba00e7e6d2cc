//! Record model
//!
//! The entities ingested from the follower list, and the `Record` trait the
//! persistence layer uses to map either shape onto its table.
//!
//! # Shapes
//!
//! - `FollowerSummary` - identifier, handle, display name, avatar, timestamps
//! - `FollowerProfile` - the summary plus viewer flags, labels and description

mod types;

pub use types::{
    join_labels, Column, FollowerProfile, FollowerSummary, Label, Page, Record, Viewer,
};

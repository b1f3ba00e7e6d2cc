//! Resume checkpoints
//!
//! After each committed page the driver records the cursor of the next page
//! in a small JSON file. A later run started without an explicit cursor picks
//! up from there. The file is removed once the collection is fully ingested.

mod manager;
mod types;

pub use manager::StateManager;
pub use types::Checkpoint;

#[cfg(test)]
mod manager_tests;

//! CLI module
//!
//! Command-line interface for the ingester.
//!
//! # Commands
//!
//! - `run` - Ingest every page (the default when no command is given)
//! - `init-db` - Create the follower table
//! - `show-config` - Print the effective configuration

mod commands;
mod runner;
mod signal;

pub use commands::{Cli, Commands, LogFormat, RunArgs, StoreArgs};
pub use runner::{ingest_as, Runner, EXIT_OK};
pub use signal::{cancel_on_signal, signal_or_pending};

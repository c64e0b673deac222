//! Chart Revisions CLI
//!
//! `chart-revisions suggest` loads a replacement map, runs one batch, and
//! prints the report. `chart-revisions conflicts` lists charts that hold
//! more than one active suggestion.
//!
//! Exit status is `0` on success, `1` on invalid input, and `2` when a batch
//! was rolled back or conflicts were found.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod logging;
mod run;
pub mod settings;

pub use run::{run, EXIT_BATCH_FAILED};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

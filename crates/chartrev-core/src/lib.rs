//! Chart Revision Engine
//!
//! Turns a variable replacement map into a batch of suggested chart
//! revisions awaiting human review.
//!
//! # Core Concepts
//!
//! - [`RevisionEngine`]: select, rewrite, and stage in one run
//! - [`EngineConfig`]: dataset, author, reason, and dry-run settings
//! - [`BatchReport`]: what was staged, skipped, and warned about
//!
//! # Errors
//!
//! A chart that cannot be rewritten is skipped and the run continues. A
//! failed conflict check or write rolls back the whole batch and returns
//! [`EngineError`].
//!
//! # Example
//!
//! ```rust,ignore
//! use chartrev_core::{EngineConfig, RevisionEngine};
//!
//! let engine = RevisionEngine::new(EngineConfig::new().with_dataset("wdi", "2"))?;
//! let report = engine.run(&mut store, &replacements)?;
//! println!("{} suggestions staged", report.committed());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod engine;
mod error;
mod report;

pub use config::EngineConfig;
pub use engine::{BatchPlan, RevisionEngine};
pub use error::EngineError;
pub use report::{BatchOutcome, BatchReport, ChartFailure, ChartWarning};

pub use chartrev_model as model;
pub use chartrev_rewrite as rewrite;
pub use chartrev_store as store;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

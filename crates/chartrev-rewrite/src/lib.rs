//! Chart Config Rewriter
//!
//! Given one chart's config, its dimension rows, a variable replacement map,
//! and the year ranges of every variable involved, computes the minimal
//! rewritten config plus advisory warnings.
//!
//! # Passes
//!
//! Each pass touches only its own substructure:
//!
//! - map layer: `map.variableId`, `map.targetYear`, `map.time`
//! - time window: `minTime`, `maxTime`
//! - text: `title`, `subtitle`, `note`, `slug` (read-only, warnings only)
//! - dimensions: `config.dimensions` and the mirrored rows, in lockstep
//!
//! # Example
//!
//! ```rust,ignore
//! use chartrev_rewrite::ConfigRewriter;
//!
//! let rewriter = ConfigRewriter::new(&replacements, &year_ranges);
//! let outcome = rewriter.rewrite(chart.id, &chart.config, &rows)?;
//! for warning in &outcome.warnings {
//!     println!("chart {}: {warning}", chart.id);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod passes;
mod rewriter;
mod warning;

pub use error::RewriteError;
pub use rewriter::{ConfigRewriter, RewriteOutcome};
pub use warning::{RewriteWarning, TextField, WindowBound};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Chart Revision Data Model
//!
//! Typed representation of everything the revision engine reads or stages.
//!
//! # Core Concepts
//!
//! - [`VariableReplacementMap`]: old -> new variable ids produced by a dataset import
//! - [`ChartConfig`]: structured chart config with explicit optional substructures
//! - [`ChartDimensionRow`]: persisted mirror of one `config.dimensions` entry
//! - [`YearRange`]: available data years for a variable
//! - [`SuggestedRevision`]: a staged rewrite awaiting human review
//!
//! # Example
//!
//! ```rust,ignore
//! use chartrev_model::VariableReplacementMap;
//!
//! let map = VariableReplacementMap::from_json_str(r#"{"2032": "147395"}"#)?;
//! assert_eq!(map.len(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod chart;
mod error;
mod ids;
mod replacement;
mod revision;

pub use chart::{
    Chart, ChartConfig, ChartDimensionRow, Dimension, MapConfig, TimeBound, YearRange, YearRanges,
};
pub use error::ModelError;
pub use ids::{ChartId, DimensionRowId, RevisionId, UserId, VariableId};
pub use replacement::{VariableReplacementMap, REPLACEMENTS_FILE_NAME};
pub use revision::{ActiveRevision, RevisionStatus, StagedRevision, SuggestedRevision};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Chart Revision Storage
//!
//! Everything that touches the relational store: reading charts and data
//! years, checking for competing suggestions, and writing a batch of
//! suggestions atomically.
//!
//! # Core Concepts
//!
//! - [`ChartRepository`]: read queries over charts, dimensions, and data points
//! - [`RevisionStore`]: begin/commit/rollback plus reads inside a transaction
//! - [`YearRangeResolver`]: min/max data year per variable
//! - [`ChartSelector`]: charts referencing a replaced variable
//! - [`ConflictChecker`]: at most one active suggestion per chart
//! - [`SuggestionWriter`]: all-or-nothing batch insert
//!
//! # Example
//!
//! ```rust,ignore
//! use chartrev_store::{SqliteStore, SuggestionWriter};
//!
//! let mut store = SqliteStore::open("charts.db")?;
//! let writer = SuggestionWriter::new("wdi (v2) bulk dataset update", user);
//! let outcome = writer.write(&mut store, &staged)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod conflict;
mod error;
mod repository;
pub mod schema;
mod selector;
mod sqlite;
mod writer;
mod year_ranges;

pub use conflict::{CheckPhase, ConflictChecker, ConflictError, ConflictReport};
pub use error::StoreError;
pub use repository::{
    ChartRecord, ChartRepository, RevisionInsert, RevisionStore, RevisionTransaction,
};
pub use selector::{ChartSelector, SelectedChart, Selection};
pub use sqlite::{SqliteStore, SqliteTransaction};
pub use writer::{SuggestionWriter, WriteError, WriteOutcome};
pub use year_ranges::YearRangeResolver;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Error types for the batch engine
//!
//! Per-chart problems never surface here: they are logged and recorded in
//! the [`crate::BatchReport`]. An [`EngineError`] means the run produced no
//! committed rows.

use chartrev_model::ModelError;
use chartrev_store::{ConflictReport, StoreError, WriteError};

/// Run-level failure
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid engine settings
    #[error("configuration error: {0}")]
    Config(String),

    /// Replacement map could not be loaded
    #[error("replacement map error: {0}")]
    Model(#[from] ModelError),

    /// A read query failed before anything was written
    #[error("store read failed: {0}")]
    Store(#[from] StoreError),

    /// The batch write was rolled back
    #[error("batch write failed: {0}")]
    Write(#[from] WriteError),
}

impl EngineError {
    /// Whether the failure aborted a batch that had been computed
    #[inline]
    #[must_use]
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Write(_))
    }

    /// Conflict diagnostics, if the batch failed a conflict check
    #[must_use]
    pub fn conflict_report(&self) -> Option<&ConflictReport> {
        match self {
            Self::Write(err) => err.conflict_report(),
            _ => None,
        }
    }
}

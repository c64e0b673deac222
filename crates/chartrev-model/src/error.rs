//! Error types for the data model

use std::path::PathBuf;

use crate::ids::{ChartId, VariableId};

/// Model parsing and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Variable id literal is not a positive decimal integer
    #[error("invalid variable id: {0:?}")]
    InvalidVariableId(String),

    /// Same old variable id listed twice
    #[error("duplicate replacement for variable {0}")]
    DuplicateVariable(VariableId),

    /// Replacement map document is malformed
    #[error("invalid replacement map: {0}")]
    InvalidReplacementMap(#[from] serde_json::Error),

    /// Replacement map file could not be read
    #[error("cannot read replacement map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored chart config does not match the expected structure
    #[error("chart {chart_id} has an invalid config: {source}")]
    InvalidChartConfig {
        chart_id: ChartId,
        #[source]
        source: serde_json::Error,
    },

    /// Revision status string is not one of the known states
    #[error("unknown revision status: {0:?}")]
    UnknownStatus(String),
}

//! Per-chart rewrite failures
//!
//! Any of these discards the rewrite of one chart; the batch carries on.

use chartrev_model::{ChartId, VariableId};

/// Reasons a single chart could not be rewritten
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// `chart_dimensions` rows and `config.dimensions` disagree before the rewrite
    #[error("chart {chart_id}: dimension rows {rows:?} do not mirror config dimensions {config:?}")]
    DimensionsOutOfSync {
        chart_id: ChartId,
        rows: Vec<(VariableId, u32)>,
        config: Vec<(VariableId, u32)>,
    },

    /// A row's order does not index into `config.dimensions`
    #[error("chart {chart_id}: dimension order {order} out of range ({len} dimensions)")]
    DimensionOrderOutOfRange {
        chart_id: ChartId,
        order: u32,
        len: usize,
    },

    /// The dimension pass reported a change that the rows do not show, or vice versa
    #[error("chart {chart_id}: changed flag {flagged} but rows changed = {rows_changed}")]
    LockstepViolation {
        chart_id: ChartId,
        flagged: bool,
        rows_changed: bool,
    },
}

impl RewriteError {
    /// Chart the failure belongs to
    #[inline]
    #[must_use]
    pub fn chart_id(&self) -> ChartId {
        match self {
            Self::DimensionsOutOfSync { chart_id, .. }
            | Self::DimensionOrderOutOfRange { chart_id, .. }
            | Self::LockstepViolation { chart_id, .. } => *chart_id,
        }
    }
}

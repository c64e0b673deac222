//! Batch report

use chartrev_model::{ChartId, RevisionId};
use chartrev_rewrite::RewriteWarning;
use serde::Serialize;

/// A chart left out of the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartFailure {
    pub chart_id: ChartId,
    pub cause: String,
}

/// An advisory warning and the chart it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartWarning {
    pub chart_id: ChartId,
    pub warning: RewriteWarning,
}

/// What happened to the staged rewrites
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Every staged rewrite is now a pending suggestion
    Committed { revision_ids: Vec<RevisionId> },
    /// A staged rewrite duplicated an existing suggestion; nothing committed
    DuplicateRolledBack,
    /// Dry run; nothing written
    DryRun,
    /// No chart needed a rewrite
    NothingToStage,
}

/// Summary of one engine run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub reason: String,
    /// Charts found referencing a replaced variable
    pub charts_considered: usize,
    /// Charts with a staged rewrite, in id order
    pub staged: Vec<ChartId>,
    pub skipped: Vec<ChartFailure>,
    pub warnings: Vec<ChartWarning>,
    pub outcome: BatchOutcome,
}

impl BatchReport {
    /// Number of suggestions made visible by this run
    #[must_use]
    pub fn committed(&self) -> usize {
        match &self.outcome {
            BatchOutcome::Committed { revision_ids } => revision_ids.len(),
            _ => 0,
        }
    }

    /// Warnings for one chart
    pub fn warnings_for(&self, chart_id: ChartId) -> impl Iterator<Item = &RewriteWarning> + '_ {
        self.warnings
            .iter()
            .filter(move |w| w.chart_id == chart_id)
            .map(|w| &w.warning)
    }
}

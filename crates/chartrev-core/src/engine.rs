//! Batch engine
//!
//! Control flow of one run: resolve data years, select charts, rewrite each
//! chart, then stage every changed config in a single transaction.

use chartrev_model::{ChartId, StagedRevision, VariableReplacementMap};
use chartrev_rewrite::ConfigRewriter;
use chartrev_store::{
    ChartRepository, ChartSelector, RevisionStore, SuggestionWriter, WriteOutcome,
    YearRangeResolver,
};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::report::{BatchOutcome, BatchReport, ChartFailure, ChartWarning};

/// Rewrites computed for one replacement map, not yet written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPlan {
    pub charts_considered: usize,
    pub staged: Vec<StagedRevision>,
    pub skipped: Vec<ChartFailure>,
    pub warnings: Vec<ChartWarning>,
}

impl BatchPlan {
    fn into_report(self, reason: String, outcome: BatchOutcome) -> BatchReport {
        BatchReport {
            reason,
            charts_considered: self.charts_considered,
            staged: self.staged.iter().map(|s| s.chart_id).collect(),
            skipped: self.skipped,
            warnings: self.warnings,
            outcome,
        }
    }
}

/// Runs revision batches
#[derive(Debug, Clone)]
pub struct RevisionEngine {
    config: EngineConfig,
}

impl RevisionEngine {
    /// Create engine
    ///
    /// # Errors
    /// Returns error if the config fails validation
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute every rewrite for `map` without writing
    ///
    /// Charts that cannot be read or rewritten are skipped and recorded.
    ///
    /// # Errors
    /// Returns error if a read query fails
    pub fn plan<R: ChartRepository + ?Sized>(
        &self,
        repo: &R,
        map: &VariableReplacementMap,
    ) -> Result<BatchPlan, EngineError> {
        let year_ranges = YearRangeResolver::new(repo).resolve_for(map)?;
        let selection = ChartSelector::new(repo).select(map)?;
        info!(
            replacements = map.len(),
            charts = selection.matched(),
            "charts selected"
        );

        let mut plan = BatchPlan {
            charts_considered: selection.matched(),
            ..BatchPlan::default()
        };
        for (chart_id, err) in selection.unreadable {
            error!(%chart_id, error = %err, "skipping chart");
            plan.skipped.push(ChartFailure {
                chart_id,
                cause: err.to_string(),
            });
        }

        let rewriter = ConfigRewriter::new(map, &year_ranges);
        for selected in selection.charts {
            let chart_id = selected.id();
            let outcome = match rewriter.rewrite(chart_id, &selected.chart.config, &selected.rows) {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(%chart_id, error = %err, "skipping chart");
                    plan.skipped.push(ChartFailure {
                        chart_id,
                        cause: err.to_string(),
                    });
                    continue;
                }
            };

            for warning in &outcome.warnings {
                warn!(%chart_id, %warning, "rewrite warning");
                plan.warnings.push(ChartWarning {
                    chart_id,
                    warning: warning.clone(),
                });
            }

            if !outcome.config_changed() {
                debug!(%chart_id, "config unchanged");
                continue;
            }
            let mut suggested = outcome.config;
            suggested.version = Some(selected.chart.version().saturating_add(1));
            plan.staged
                .push(StagedRevision::new(chart_id, selected.chart.config, suggested));
        }

        info!(
            staged = plan.staged.len(),
            skipped = plan.skipped.len(),
            warnings = plan.warnings.len(),
            "rewrites computed"
        );
        Ok(plan)
    }

    /// Plan and, unless in dry-run mode, stage the batch atomically
    ///
    /// # Errors
    /// Returns error if a read query fails or the write is rolled back for
    /// any reason other than a benign duplicate
    pub fn run<S: ChartRepository + RevisionStore>(
        &self,
        store: &mut S,
        map: &VariableReplacementMap,
    ) -> Result<BatchReport, EngineError> {
        let reason = self.config.reason();
        let plan = self.plan(&*store, map)?;

        if plan.staged.is_empty() {
            info!(%reason, "nothing to stage");
            return Ok(plan.into_report(reason, BatchOutcome::NothingToStage));
        }
        if self.config.dry_run {
            info!(%reason, staged = plan.staged.len(), "dry run, nothing written");
            return Ok(plan.into_report(reason, BatchOutcome::DryRun));
        }

        let writer = SuggestionWriter::new(reason.clone(), self.config.created_by);
        let outcome = match writer.write(store, &plan.staged) {
            Ok(WriteOutcome::Committed { revision_ids }) => BatchOutcome::Committed { revision_ids },
            Ok(WriteOutcome::DuplicateRolledBack { .. }) => BatchOutcome::DuplicateRolledBack,
            Err(err) => {
                let charts: Vec<ChartId> = plan.staged.iter().map(|s| s.chart_id).collect();
                error!(%reason, ?charts, error = %err, "batch aborted");
                return Err(err.into());
            }
        };
        Ok(plan.into_report(reason, outcome))
    }
}

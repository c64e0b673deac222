//! Transactional suggestion writer
//!
//! One batch is one transaction: pre-check, insert every row as pending,
//! post-check, commit. Any failure rolls the whole batch back, so a write
//! is observed as either all N rows or none.

use std::collections::BTreeSet;

use chartrev_model::{ChartId, RevisionId, RevisionStatus, StagedRevision, UserId};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::conflict::{ConflictChecker, ConflictError, ConflictReport};
use crate::error::StoreError;
use crate::repository::{RevisionInsert, RevisionStore, RevisionTransaction};

/// Result of a batch that did not fail hard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// Every row committed
    Committed { revision_ids: Vec<RevisionId> },
    /// An insert duplicated an existing active row; nothing was committed
    DuplicateRolledBack { attempted: usize },
}

impl WriteOutcome {
    /// Rows made visible by the write
    #[must_use]
    pub fn committed(&self) -> usize {
        match self {
            Self::Committed { revision_ids } => revision_ids.len(),
            Self::DuplicateRolledBack { .. } => 0,
        }
    }
}

/// Batch-fatal write failure; the transaction was rolled back
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Pre- or post-check found charts with competing suggestions
    #[error("batch of {attempted} rolled back: {source}")]
    Conflict {
        attempted: usize,
        #[source]
        source: ConflictError,
    },

    /// Any other backend failure
    #[error("batch write failed ({inserted} of {attempted} rows inserted): {source}")]
    Failed {
        attempted: usize,
        inserted: usize,
        #[source]
        source: StoreError,
    },
}

impl WriteError {
    /// Conflict diagnostics, when the failure came from a check
    #[must_use]
    pub fn conflict_report(&self) -> Option<&ConflictReport> {
        match self {
            Self::Conflict { source, .. } => source.report(),
            Self::Failed { .. } => None,
        }
    }

    /// Rows the batch tried to write
    #[inline]
    #[must_use]
    pub fn attempted(&self) -> usize {
        match self {
            Self::Conflict { attempted, .. } | Self::Failed { attempted, .. } => *attempted,
        }
    }
}

enum StageError {
    Conflict(ConflictError),
    Store(StoreError),
}

impl From<ConflictError> for StageError {
    fn from(err: ConflictError) -> Self {
        match err {
            ConflictError::Store(err) => Self::Store(err),
            other => Self::Conflict(other),
        }
    }
}

impl From<StoreError> for StageError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Stages suggested revisions for review
#[derive(Debug, Clone)]
pub struct SuggestionWriter {
    reason: String,
    created_by: UserId,
    checker: ConflictChecker,
}

impl SuggestionWriter {
    /// Create writer attaching `reason` and `created_by` to every row
    #[must_use]
    pub fn new(reason: impl Into<String>, created_by: UserId) -> Self {
        Self {
            reason: reason.into(),
            created_by,
            checker: ConflictChecker::new(),
        }
    }

    /// Reason attached to every row
    #[inline]
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Write `batch` atomically
    ///
    /// An insert rejected as an exact duplicate rolls back and returns
    /// [`WriteOutcome::DuplicateRolledBack`].
    ///
    /// # Errors
    /// Returns [`WriteError`] after rolling back on a failed conflict check
    /// or any other backend error
    pub fn write<S: RevisionStore>(
        &self,
        store: &mut S,
        batch: &[StagedRevision],
    ) -> Result<WriteOutcome, WriteError> {
        let attempted = batch.len();
        if batch.is_empty() {
            return Ok(WriteOutcome::Committed {
                revision_ids: Vec::new(),
            });
        }
        let chart_ids: BTreeSet<ChartId> = batch.iter().map(|s| s.chart_id).collect();

        let mut tx = store.begin().map_err(|source| WriteError::Failed {
            attempted,
            inserted: 0,
            source,
        })?;

        match self.stage(&mut tx, &chart_ids, batch) {
            Ok(revision_ids) => {
                tx.commit().map_err(|source| {
                    error!(attempted, error = %source, "commit failed");
                    WriteError::Failed {
                        attempted,
                        inserted: 0,
                        source,
                    }
                })?;
                info!(committed = revision_ids.len(), reason = %self.reason, "suggestions staged");
                Ok(WriteOutcome::Committed { revision_ids })
            }
            Err(StageError::Store(err)) if err.is_unique_violation() => {
                roll_back(tx);
                warn!(attempted, error = %err, "duplicate suggestion, batch rolled back");
                Ok(WriteOutcome::DuplicateRolledBack { attempted })
            }
            Err(StageError::Store(source)) => {
                roll_back(tx);
                error!(attempted, inserted = 0, error = %source, "batch write failed, rolled back");
                Err(WriteError::Failed {
                    attempted,
                    inserted: 0,
                    source,
                })
            }
            Err(StageError::Conflict(source)) => {
                roll_back(tx);
                if let Some(report) = source.report() {
                    error!(attempted, %report, "conflicting suggestions, batch rolled back");
                }
                Err(WriteError::Conflict { attempted, source })
            }
        }
    }

    fn stage<T: RevisionTransaction>(
        &self,
        tx: &mut T,
        chart_ids: &BTreeSet<ChartId>,
        batch: &[StagedRevision],
    ) -> Result<Vec<RevisionId>, StageError> {
        self.checker.pre_check(&*tx, chart_ids)?;

        let created_at = Utc::now();
        let mut revision_ids = Vec::with_capacity(batch.len());
        for staged in batch {
            let row = RevisionInsert {
                chart_id: staged.chart_id,
                original_config: staged.original_config.clone(),
                suggested_config: staged.suggested_config.clone(),
                suggested_reason: self.reason.clone(),
                status: RevisionStatus::Pending,
                created_by: self.created_by,
                created_at,
            };
            revision_ids.push(tx.insert_revision(&row)?);
        }

        self.checker.post_check(&*tx, chart_ids)?;
        Ok(revision_ids)
    }
}

fn roll_back<T: RevisionTransaction>(tx: T) {
    if let Err(err) = tx.rollback() {
        error!(error = %err, "rollback failed");
    }
}

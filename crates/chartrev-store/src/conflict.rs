//! Active-suggestion conflict checks
//!
//! A chart may hold at most one pending or flagged suggestion. The writer
//! checks before inserting (nothing may exist yet) and again before commit
//! (only its own row may exist), which catches a concurrent batch that
//! inserted in between without needing a cross-process lock.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chartrev_model::{ActiveRevision, ChartId, RevisionId};
use serde::Serialize;

use crate::error::StoreError;
use crate::repository::{RevisionStore, RevisionTransaction};

/// When a check runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPhase {
    /// Before any insert of this batch
    BeforeWrite,
    /// After this batch inserted its rows, before commit
    AfterWrite,
    /// Standalone inspection of committed rows
    Audit,
}

impl CheckPhase {
    /// Active suggestions a chart may hold in this phase
    #[inline]
    #[must_use]
    pub fn allowed(self) -> usize {
        match self {
            Self::BeforeWrite => 0,
            Self::AfterWrite | Self::Audit => 1,
        }
    }
}

impl fmt::Display for CheckPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BeforeWrite => "pre-check",
            Self::AfterWrite => "post-check",
            Self::Audit => "audit",
        })
    }
}

/// Charts exceeding the allowed number of active suggestions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    pub phase: CheckPhase,
    /// Offending chart -> ids of all its active suggestions, oldest first
    pub conflicts: BTreeMap<ChartId, Vec<RevisionId>>,
}

impl ConflictReport {
    /// Build report from active rows; rows must already be in creation order
    #[must_use]
    pub fn from_active(phase: CheckPhase, active: &[ActiveRevision]) -> Self {
        let mut by_chart: BTreeMap<ChartId, Vec<&ActiveRevision>> = BTreeMap::new();
        for revision in active {
            by_chart.entry(revision.chart_id).or_default().push(revision);
        }
        let conflicts = by_chart
            .into_iter()
            .filter(|(_, revisions)| revisions.len() > phase.allowed())
            .map(|(chart_id, mut revisions)| {
                revisions.sort_by_key(|r| (r.created_at, r.id));
                (chart_id, revisions.into_iter().map(|r| r.id).collect())
            })
            .collect();
        Self { phase, conflicts }
    }

    /// Whether no chart is in conflict
    #[inline]
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Offending chart ids
    pub fn chart_ids(&self) -> impl Iterator<Item = ChartId> + '_ {
        self.conflicts.keys().copied()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} found {} chart(s) in conflict", self.phase, self.conflicts.len())?;
        for (chart_id, ids) in &self.conflicts {
            let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
            write!(f, "; chart {chart_id}: suggestions [{}]", ids.join(", "))?;
        }
        Ok(())
    }
}

/// Conflict check failure
#[derive(Debug, thiserror::Error)]
pub enum ConflictError {
    /// Some charts already had an active suggestion
    #[error("charts already have active suggestions: {0}")]
    AlreadyStaged(ConflictReport),

    /// Another writer staged the same charts while this batch was inserting
    #[error("concurrent suggestions detected: {0}")]
    Concurrent(ConflictReport),

    /// The check query itself failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConflictError {
    /// Report behind the failure, if the check ran
    #[must_use]
    pub fn report(&self) -> Option<&ConflictReport> {
        match self {
            Self::AlreadyStaged(report) | Self::Concurrent(report) => Some(report),
            Self::Store(_) => None,
        }
    }
}

/// Runs the pre/post write checks
#[derive(Debug, Default, Clone, Copy)]
pub struct ConflictChecker;

impl ConflictChecker {
    /// Create checker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Report for `chart_ids` as seen by an open transaction
    ///
    /// # Errors
    /// Returns error if the query fails
    pub fn inspect<T: RevisionTransaction + ?Sized>(
        &self,
        tx: &T,
        chart_ids: &BTreeSet<ChartId>,
        phase: CheckPhase,
    ) -> Result<ConflictReport, StoreError> {
        let active = tx.active_revisions(chart_ids)?;
        Ok(ConflictReport::from_active(phase, &active))
    }

    /// Fail if any chart already has an active suggestion
    ///
    /// # Errors
    /// Returns [`ConflictError::AlreadyStaged`] naming every such chart
    pub fn pre_check<T: RevisionTransaction + ?Sized>(
        &self,
        tx: &T,
        chart_ids: &BTreeSet<ChartId>,
    ) -> Result<(), ConflictError> {
        let report = self.inspect(tx, chart_ids, CheckPhase::BeforeWrite)?;
        if report.is_clear() {
            Ok(())
        } else {
            Err(ConflictError::AlreadyStaged(report))
        }
    }

    /// Fail if any chart now has more than one active suggestion
    ///
    /// # Errors
    /// Returns [`ConflictError::Concurrent`] naming every such chart and all
    /// of its suggestion ids in creation order
    pub fn post_check<T: RevisionTransaction + ?Sized>(
        &self,
        tx: &T,
        chart_ids: &BTreeSet<ChartId>,
    ) -> Result<(), ConflictError> {
        let report = self.inspect(tx, chart_ids, CheckPhase::AfterWrite)?;
        if report.is_clear() {
            Ok(())
        } else {
            Err(ConflictError::Concurrent(report))
        }
    }

    /// Every chart currently holding more than one committed active suggestion
    ///
    /// # Errors
    /// Returns error if the query fails
    pub fn audit<S: RevisionStore + ?Sized>(&self, store: &S) -> Result<ConflictReport, StoreError> {
        let active = store.list_active_revisions()?;
        Ok(ConflictReport::from_active(CheckPhase::Audit, &active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartrev_model::RevisionStatus;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn active(id: i64, chart: i64, second: u32) -> ActiveRevision {
        ActiveRevision {
            id: RevisionId(id),
            chart_id: ChartId(chart),
            status: RevisionStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, second).unwrap(),
        }
    }

    #[test]
    fn before_write_allows_nothing() {
        let report = ConflictReport::from_active(CheckPhase::BeforeWrite, &[active(1, 42, 0)]);
        assert_eq!(report.chart_ids().collect::<Vec<_>>(), vec![ChartId(42)]);
    }

    #[test]
    fn after_write_allows_own_row() {
        let rows = [active(1, 42, 0), active(2, 7, 1), active(3, 42, 2)];
        let report = ConflictReport::from_active(CheckPhase::AfterWrite, &rows);

        let mut expected = BTreeMap::new();
        expected.insert(ChartId(42), vec![RevisionId(1), RevisionId(3)]);
        assert_eq!(report.conflicts, expected);
    }

    #[test]
    fn ids_follow_creation_time() {
        let rows = [active(9, 42, 5), active(4, 42, 1)];
        let report = ConflictReport::from_active(CheckPhase::AfterWrite, &rows);
        assert_eq!(report.conflicts[&ChartId(42)], vec![RevisionId(4), RevisionId(9)]);
    }

    #[test]
    fn display_names_charts_and_ids() {
        let rows = [active(1, 42, 0), active(3, 42, 2)];
        let report = ConflictReport::from_active(CheckPhase::AfterWrite, &rows);
        assert_eq!(
            report.to_string(),
            "post-check found 1 chart(s) in conflict; chart 42: suggestions [1, 3]"
        );
    }
}

//! Storage collaborator traits
//!
//! Reads are plain queries and are not part of the write transaction. Writes
//! go through [`RevisionStore::begin`]; the backend only has to offer
//! begin/commit/rollback and ad hoc reads inside the transaction. No row
//! locking is assumed.

use std::collections::BTreeSet;

use chartrev_model::{
    ActiveRevision, Chart, ChartConfig, ChartDimensionRow, ChartId, ModelError, RevisionId,
    RevisionStatus, UserId, VariableId, YearRanges,
};
use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// A `charts` row before its config is parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRecord {
    pub id: ChartId,
    pub config_json: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ChartRecord {
    /// Parse the stored config
    ///
    /// # Errors
    /// Returns error if the config does not match the chart config structure
    pub fn parse(&self) -> Result<Chart, ModelError> {
        let config = ChartConfig::from_json(self.id, &self.config_json)?;
        Ok(Chart {
            id: self.id,
            config,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Values for one new `suggested_chart_revisions` row
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionInsert {
    pub chart_id: ChartId,
    pub original_config: ChartConfig,
    pub suggested_config: ChartConfig,
    pub suggested_reason: String,
    pub status: RevisionStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Read-only queries against charts, dimensions, and data points
pub trait ChartRepository {
    /// Charts with the given ids
    fn charts_by_ids(&self, ids: &BTreeSet<ChartId>) -> Result<Vec<ChartRecord>, StoreError>;

    /// Dimension rows plotting any of the given variables
    fn dimensions_by_variables(
        &self,
        ids: &BTreeSet<VariableId>,
    ) -> Result<Vec<ChartDimensionRow>, StoreError>;

    /// Every dimension row of the given charts
    fn dimensions_by_charts(
        &self,
        ids: &BTreeSet<ChartId>,
    ) -> Result<Vec<ChartDimensionRow>, StoreError>;

    /// Charts whose `config.map.variableId` is one of the given variables
    fn chart_ids_by_map_variables(
        &self,
        ids: &BTreeSet<VariableId>,
    ) -> Result<BTreeSet<ChartId>, StoreError>;

    /// Min/max data year per variable; variables without data points are absent
    fn year_ranges(&self, ids: &BTreeSet<VariableId>) -> Result<YearRanges, StoreError>;
}

/// One open write transaction
pub trait RevisionTransaction {
    /// Pending or flagged revisions of the given charts, as seen by this transaction
    fn active_revisions(&self, chart_ids: &BTreeSet<ChartId>) -> Result<Vec<ActiveRevision>, StoreError>;

    /// Insert one row
    fn insert_revision(&mut self, row: &RevisionInsert) -> Result<RevisionId, StoreError>;

    /// Make every insert visible
    fn commit(self) -> Result<(), StoreError>;

    /// Discard every insert
    fn rollback(self) -> Result<(), StoreError>;
}

/// Store that can stage suggested revisions
pub trait RevisionStore {
    /// Transaction handle
    type Transaction<'a>: RevisionTransaction
    where
        Self: 'a;

    /// Open a write transaction
    fn begin(&mut self) -> Result<Self::Transaction<'_>, StoreError>;

    /// Every committed pending or flagged revision
    fn list_active_revisions(&self) -> Result<Vec<ActiveRevision>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_record_parses_config() {
        let record = ChartRecord {
            id: ChartId(8),
            config_json: r#"{"title": "Deaths", "version": 4}"#.to_string(),
            created_at: None,
            updated_at: None,
        };
        let chart = record.parse().unwrap();
        assert_eq!(chart.id, ChartId(8));
        assert_eq!(chart.version(), 4);
        assert_eq!(chart.config.title.as_deref(), Some("Deaths"));
    }

    #[test]
    fn chart_record_rejects_bad_config() {
        let record = ChartRecord {
            id: ChartId(8),
            config_json: "[]".to_string(),
            created_at: None,
            updated_at: None,
        };
        assert!(record.parse().is_err());
    }
}

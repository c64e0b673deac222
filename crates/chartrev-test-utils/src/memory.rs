//! In-memory store with per-transaction staging
//!
//! Several [`MemoryStore`] handles share one committed state, standing in
//! for independent batch jobs on one database. Uncommitted inserts are only
//! visible to their own transaction. An optional one-shot hook runs right
//! before a transaction's first insert, which is where a competing batch
//! gets to commit in race tests.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chartrev_model::{
    ActiveRevision, ChartConfig, ChartDimensionRow, ChartId, RevisionId, SuggestedRevision,
    VariableId, YearRange, YearRanges,
};
use chartrev_store::{
    ChartRecord, ChartRepository, RevisionInsert, RevisionStore, RevisionTransaction, StoreError,
};
use parking_lot::Mutex;

use crate::dimension_rows;

#[derive(Debug, Default)]
struct Shared {
    charts: BTreeMap<ChartId, String>,
    dimensions: Vec<ChartDimensionRow>,
    years: YearRanges,
    revisions: Vec<SuggestedRevision>,
    next_revision: i64,
}

impl Shared {
    fn duplicates(&self, row: &RevisionInsert, staged: &[SuggestedRevision]) -> bool {
        self.revisions
            .iter()
            .chain(staged)
            .filter(|r| r.status.is_active())
            .any(|r| {
                r.chart_id == row.chart_id
                    && r.original_config == row.original_config
                    && r.suggested_config == row.suggested_config
            })
    }
}

type Hook = Box<dyn FnOnce() + Send>;

/// Shared in-memory chart and revision store
#[derive(Default)]
pub struct MemoryStore {
    shared: Arc<Mutex<Shared>>,
    before_first_insert: Option<Hook>,
    fail_after_inserts: Option<usize>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("shared", &self.shared)
            .field("hook", &self.before_first_insert.is_some())
            .field("fail_after_inserts", &self.fail_after_inserts)
            .finish()
    }
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Another handle on the same committed state, without hooks
    pub fn handle(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            before_first_insert: None,
            fail_after_inserts: None,
        }
    }

    /// Add a chart and the dimension rows mirroring its config
    pub fn with_chart(self, chart_id: ChartId, config: &ChartConfig) -> Self {
        let json = serde_json::to_string(config).unwrap();
        self.with_raw_chart(chart_id, json, dimension_rows(chart_id, config))
    }

    /// Add a chart with an arbitrary stored config and explicit rows
    pub fn with_raw_chart(
        self,
        chart_id: ChartId,
        config_json: impl Into<String>,
        rows: Vec<ChartDimensionRow>,
    ) -> Self {
        {
            let mut shared = self.shared.lock();
            shared.charts.insert(chart_id, config_json.into());
            shared.dimensions.retain(|r| r.chart_id != chart_id);
            shared.dimensions.extend(rows);
        }
        self
    }

    /// Record the data years of a variable
    pub fn with_years(self, variable: VariableId, range: YearRange) -> Self {
        self.shared.lock().years.insert(variable, range);
        self
    }

    /// Run `hook` once, right before the next transaction's first insert
    pub fn before_first_insert(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.before_first_insert = Some(Box::new(hook));
        self
    }

    /// Fail every insert after the first `n` of a transaction with a backend error
    pub fn fail_after_inserts(mut self, n: usize) -> Self {
        self.fail_after_inserts = Some(n);
        self
    }

    /// Every committed revision, in insertion order
    pub fn committed_revisions(&self) -> Vec<SuggestedRevision> {
        self.shared.lock().revisions.clone()
    }
}

impl ChartRepository for MemoryStore {
    fn charts_by_ids(&self, ids: &BTreeSet<ChartId>) -> Result<Vec<ChartRecord>, StoreError> {
        let shared = self.shared.lock();
        Ok(shared
            .charts
            .iter()
            .filter(|(id, _)| ids.contains(id))
            .map(|(id, json)| ChartRecord {
                id: *id,
                config_json: json.clone(),
                created_at: None,
                updated_at: None,
            })
            .collect())
    }

    fn dimensions_by_variables(
        &self,
        ids: &BTreeSet<VariableId>,
    ) -> Result<Vec<ChartDimensionRow>, StoreError> {
        let shared = self.shared.lock();
        Ok(shared
            .dimensions
            .iter()
            .filter(|r| ids.contains(&r.variable_id))
            .cloned()
            .collect())
    }

    fn dimensions_by_charts(
        &self,
        ids: &BTreeSet<ChartId>,
    ) -> Result<Vec<ChartDimensionRow>, StoreError> {
        let shared = self.shared.lock();
        Ok(shared
            .dimensions
            .iter()
            .filter(|r| ids.contains(&r.chart_id))
            .cloned()
            .collect())
    }

    fn chart_ids_by_map_variables(
        &self,
        ids: &BTreeSet<VariableId>,
    ) -> Result<BTreeSet<ChartId>, StoreError> {
        let shared = self.shared.lock();
        Ok(shared
            .charts
            .iter()
            .filter(|(_, json)| {
                serde_json::from_str::<serde_json::Value>(json)
                    .ok()
                    .and_then(|doc| doc.pointer("/map/variableId").and_then(serde_json::Value::as_i64))
                    .is_some_and(|id| ids.contains(&VariableId(id)))
            })
            .map(|(id, _)| *id)
            .collect())
    }

    fn year_ranges(&self, ids: &BTreeSet<VariableId>) -> Result<YearRanges, StoreError> {
        let shared = self.shared.lock();
        Ok(shared
            .years
            .iter()
            .filter(|(id, _)| ids.contains(id))
            .map(|(id, range)| (*id, *range))
            .collect())
    }
}

/// Open transaction on a [`MemoryStore`]
pub struct MemoryTransaction<'a> {
    store: &'a mut MemoryStore,
    staged: Vec<SuggestedRevision>,
}

impl fmt::Debug for MemoryTransaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransaction")
            .field("staged", &self.staged.len())
            .finish()
    }
}

fn active(revision: &SuggestedRevision) -> ActiveRevision {
    ActiveRevision {
        id: revision.id,
        chart_id: revision.chart_id,
        status: revision.status,
        created_at: revision.created_at,
    }
}

impl RevisionTransaction for MemoryTransaction<'_> {
    fn active_revisions(&self, chart_ids: &BTreeSet<ChartId>) -> Result<Vec<ActiveRevision>, StoreError> {
        let shared = self.store.shared.lock();
        let mut rows: Vec<ActiveRevision> = shared
            .revisions
            .iter()
            .chain(&self.staged)
            .filter(|r| r.status.is_active() && chart_ids.contains(&r.chart_id))
            .map(active)
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }

    fn insert_revision(&mut self, row: &RevisionInsert) -> Result<RevisionId, StoreError> {
        if let Some(hook) = self.store.before_first_insert.take() {
            hook();
        }
        if self
            .store
            .fail_after_inserts
            .is_some_and(|n| self.staged.len() >= n)
        {
            return Err(StoreError::Backend("injected insert failure".to_string()));
        }

        let mut shared = self.store.shared.lock();
        if shared.duplicates(row, &self.staged) {
            return Err(StoreError::UniqueViolation(format!(
                "active revision for chart {} already exists",
                row.chart_id
            )));
        }
        shared.next_revision += 1;
        let id = RevisionId(shared.next_revision);
        self.staged.push(SuggestedRevision {
            id,
            chart_id: row.chart_id,
            original_config: row.original_config.clone(),
            suggested_config: row.suggested_config.clone(),
            suggested_reason: row.suggested_reason.clone(),
            status: row.status,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.created_at,
        });
        Ok(id)
    }

    fn commit(self) -> Result<(), StoreError> {
        let mut shared = self.store.shared.lock();
        for (i, revision) in self.staged.iter().enumerate() {
            let insert = RevisionInsert {
                chart_id: revision.chart_id,
                original_config: revision.original_config.clone(),
                suggested_config: revision.suggested_config.clone(),
                suggested_reason: revision.suggested_reason.clone(),
                status: revision.status,
                created_by: revision.created_by,
                created_at: revision.created_at,
            };
            if shared.duplicates(&insert, &self.staged[..i]) {
                return Err(StoreError::UniqueViolation(format!(
                    "active revision for chart {} committed concurrently",
                    revision.chart_id
                )));
            }
        }
        shared.revisions.extend(self.staged);
        Ok(())
    }

    fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl RevisionStore for MemoryStore {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn begin(&mut self) -> Result<Self::Transaction<'_>, StoreError> {
        Ok(MemoryTransaction {
            store: self,
            staged: Vec::new(),
        })
    }

    fn list_active_revisions(&self) -> Result<Vec<ActiveRevision>, StoreError> {
        let shared = self.shared.lock();
        let mut rows: Vec<ActiveRevision> = shared
            .revisions
            .iter()
            .filter(|r| r.status.is_active())
            .map(active)
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }
}

//! SQLite backend
//!
//! Write transactions start with `BEGIN IMMEDIATE`, so a second batch job on
//! the same database waits (up to the busy timeout) instead of interleaving.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use chartrev_model::{
    ActiveRevision, ChartDimensionRow, ChartId, DimensionRowId, RevisionId, RevisionStatus,
    VariableId, YearRange, YearRanges,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

use crate::error::StoreError;
use crate::repository::{
    ChartRecord, ChartRepository, RevisionInsert, RevisionStore, RevisionTransaction,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// `?, ?, ?` for an IN list of `n` values
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Fixed-width UTC timestamp so stored values sort chronologically as text
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

fn dimension_from_row(row: &Row<'_>) -> rusqlite::Result<ChartDimensionRow> {
    Ok(ChartDimensionRow {
        id: DimensionRowId(row.get(0)?),
        chart_id: ChartId(row.get(1)?),
        variable_id: VariableId(row.get(2)?),
        property: row.get(3)?,
        order: row.get(4)?,
    })
}

fn active_from_row(row: &Row<'_>) -> Result<ActiveRevision, StoreError> {
    let status: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    Ok(ActiveRevision {
        id: RevisionId(row.get(0)?),
        chart_id: ChartId(row.get(1)?),
        status: status.parse::<RevisionStatus>()?,
        created_at: parse_timestamp(&created_at).ok_or_else(|| StoreError::InvalidRow {
            table: "suggested_chart_revisions",
            reason: format!("bad createdAt {created_at:?}"),
        })?,
    })
}

fn query_active(
    conn: &Connection,
    chart_ids: Option<&BTreeSet<ChartId>>,
) -> Result<Vec<ActiveRevision>, StoreError> {
    let mut sql = String::from(
        "SELECT id, chartId, status, createdAt FROM suggested_chart_revisions \
         WHERE status IN ('pending', 'flagged')",
    );
    let ids: Vec<i64> = chart_ids
        .map(|ids| ids.iter().map(|id| id.get()).collect())
        .unwrap_or_default();
    if let Some(chart_ids) = chart_ids {
        if chart_ids.is_empty() {
            return Ok(Vec::new());
        }
        sql.push_str(&format!(" AND chartId IN ({})", placeholders(ids.len())));
    }
    sql.push_str(" ORDER BY createdAt, id");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(ids.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(active_from_row(row)?);
    }
    Ok(out)
}

/// SQLite-backed chart repository and revision store
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file
    ///
    /// # Errors
    /// Returns error if the file cannot be opened
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    /// Returns error if SQLite cannot allocate the database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection
    ///
    /// # Errors
    /// Returns error if the busy timeout cannot be set
    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }

    /// Underlying connection
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create any missing table
    ///
    /// # Errors
    /// Returns error if the DDL fails
    pub fn create_tables(&self) -> Result<(), StoreError> {
        crate::schema::create_tables(&self.conn)
    }

    fn dimensions_where(
        &self,
        column: &str,
        ids: &[i64],
    ) -> Result<Vec<ChartDimensionRow>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, chartId, variableId, property, \"order\" FROM chart_dimensions \
             WHERE {column} IN ({}) ORDER BY chartId, \"order\"",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), dimension_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }
}

impl ChartRepository for SqliteStore {
    fn charts_by_ids(&self, ids: &BTreeSet<ChartId>) -> Result<Vec<ChartRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, config, createdAt, updatedAt FROM charts WHERE id IN ({}) ORDER BY id",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter().map(|id| id.get())), |row| {
            let created_at: Option<String> = row.get(2)?;
            let updated_at: Option<String> = row.get(3)?;
            Ok(ChartRecord {
                id: ChartId(row.get(0)?),
                config_json: row.get(1)?,
                created_at: created_at.as_deref().and_then(parse_timestamp),
                updated_at: updated_at.as_deref().and_then(parse_timestamp),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    fn dimensions_by_variables(
        &self,
        ids: &BTreeSet<VariableId>,
    ) -> Result<Vec<ChartDimensionRow>, StoreError> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        self.dimensions_where("variableId", &ids)
    }

    fn dimensions_by_charts(
        &self,
        ids: &BTreeSet<ChartId>,
    ) -> Result<Vec<ChartDimensionRow>, StoreError> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        self.dimensions_where("chartId", &ids)
    }

    fn chart_ids_by_map_variables(
        &self,
        ids: &BTreeSet<VariableId>,
    ) -> Result<BTreeSet<ChartId>, StoreError> {
        if ids.is_empty() {
            return Ok(BTreeSet::new());
        }
        let sql = format!(
            "SELECT id FROM charts \
             WHERE json_type(config, '$.map.variableId') = 'integer' \
               AND json_extract(config, '$.map.variableId') IN ({})",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter().map(|id| id.get())), |row| {
            row.get::<_, i64>(0).map(ChartId)
        })?;
        rows.collect::<Result<BTreeSet<_>, _>>().map_err(StoreError::from)
    }

    fn year_ranges(&self, ids: &BTreeSet<VariableId>) -> Result<YearRanges, StoreError> {
        if ids.is_empty() {
            return Ok(YearRanges::new());
        }
        let sql = format!(
            "SELECT variableId, MIN(year), MAX(year) FROM data_points \
             WHERE variableId IN ({}) GROUP BY variableId",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter().map(|id| id.get())), |row| {
            Ok((
                VariableId(row.get(0)?),
                YearRange::new(row.get(1)?, row.get(2)?),
            ))
        })?;
        rows.collect::<Result<YearRanges, _>>().map_err(StoreError::from)
    }
}

/// Open SQLite write transaction
#[derive(Debug)]
pub struct SqliteTransaction<'a> {
    tx: Transaction<'a>,
}

impl RevisionTransaction for SqliteTransaction<'_> {
    fn active_revisions(&self, chart_ids: &BTreeSet<ChartId>) -> Result<Vec<ActiveRevision>, StoreError> {
        query_active(&self.tx, Some(chart_ids))
    }

    fn insert_revision(&mut self, row: &RevisionInsert) -> Result<RevisionId, StoreError> {
        let created_at = format_timestamp(row.created_at);
        self.tx.execute(
            "INSERT INTO suggested_chart_revisions \
             (chartId, originalConfig, suggestedConfig, suggestedReason, status, createdBy, createdAt, updatedAt) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                row.chart_id.get(),
                row.original_config.to_json()?,
                row.suggested_config.to_json()?,
                row.suggested_reason,
                row.status.as_str(),
                row.created_by.get(),
                created_at,
            ],
        )?;
        Ok(RevisionId(self.tx.last_insert_rowid()))
    }

    fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().map_err(StoreError::from)
    }

    fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().map_err(StoreError::from)
    }
}

impl RevisionStore for SqliteStore {
    type Transaction<'a> = SqliteTransaction<'a>;

    fn begin(&mut self) -> Result<Self::Transaction<'_>, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(SqliteTransaction { tx })
    }

    fn list_active_revisions(&self) -> Result<Vec<ActiveRevision>, StoreError> {
        query_active(&self.conn, None)
    }
}

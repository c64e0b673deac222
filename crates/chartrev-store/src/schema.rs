//! Table layout used by [`crate::SqliteStore`]
//!
//! Bootstrap for local databases and tests. Production schemas are managed
//! by the charting system; this only mirrors the columns the engine reads
//! and writes.

use rusqlite::Connection;

use crate::error::StoreError;

/// DDL for every table the engine touches
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS charts (
    id INTEGER PRIMARY KEY,
    config TEXT NOT NULL,
    createdAt TEXT,
    updatedAt TEXT
);

CREATE TABLE IF NOT EXISTS chart_dimensions (
    id INTEGER PRIMARY KEY,
    chartId INTEGER NOT NULL REFERENCES charts(id),
    variableId INTEGER NOT NULL,
    property TEXT NOT NULL,
    "order" INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS chart_dimensions_variable ON chart_dimensions(variableId);
CREATE INDEX IF NOT EXISTS chart_dimensions_chart ON chart_dimensions(chartId);

CREATE TABLE IF NOT EXISTS data_points (
    variableId INTEGER NOT NULL,
    entityId INTEGER NOT NULL,
    year INTEGER NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (variableId, entityId, year)
);

CREATE TABLE IF NOT EXISTS suggested_chart_revisions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chartId INTEGER NOT NULL REFERENCES charts(id),
    originalConfig TEXT NOT NULL,
    suggestedConfig TEXT NOT NULL,
    suggestedReason TEXT,
    status TEXT NOT NULL CHECK (status IN ('pending', 'approved', 'rejected', 'flagged')),
    createdBy INTEGER NOT NULL,
    createdAt TEXT NOT NULL,
    updatedAt TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS suggested_chart_revisions_chart ON suggested_chart_revisions(chartId, status);
CREATE UNIQUE INDEX IF NOT EXISTS suggested_chart_revisions_active
    ON suggested_chart_revisions(chartId, originalConfig, suggestedConfig)
    WHERE status IN ('pending', 'flagged');
"#;

/// Create any missing table or index
///
/// # Errors
/// Returns error if the DDL fails
pub fn create_tables(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
                 ('charts', 'chart_dimensions', 'data_points', 'suggested_chart_revisions')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 4);
    }
}

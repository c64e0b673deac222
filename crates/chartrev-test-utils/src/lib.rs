//! Testing utilities for the chart revision workspace
//!
//! Shared builders, a seeded SQLite fixture, and an in-memory store whose
//! transactions can be interleaved deterministically.

#![allow(missing_docs)]

mod memory;

use chartrev_model::{
    ChartConfig, ChartDimensionRow, ChartId, Dimension, DimensionRowId, StagedRevision,
    VariableId, VariableReplacementMap, YearRange, YearRanges,
};
use chartrev_store::{SqliteStore, StoreError};
use rusqlite::params;

pub use memory::{MemoryStore, MemoryTransaction};

/// Config plotting `variables` as `y` dimensions in order
pub fn config_with_dimensions(variables: &[i64]) -> ChartConfig {
    ChartConfig {
        dimensions: Some(
            variables
                .iter()
                .zip(0u32..)
                .map(|(v, order)| Dimension::new(VariableId(*v), "y", order))
                .collect(),
        ),
        ..ChartConfig::default()
    }
}

/// Dimension rows mirroring `config.dimensions`; row id is `chart * 100 + order`
pub fn dimension_rows(chart_id: ChartId, config: &ChartConfig) -> Vec<ChartDimensionRow> {
    config
        .dimensions
        .iter()
        .flatten()
        .zip(0u32..)
        .map(|(d, order)| ChartDimensionRow {
            id: DimensionRowId(chart_id.get() * 100 + i64::from(order)),
            chart_id,
            variable_id: d.variable_id,
            property: d.property.clone(),
            order: d.order.unwrap_or(order),
        })
        .collect()
}

/// Replacement map from `(old, new)` pairs
pub fn replacement_map(pairs: &[(i64, i64)]) -> VariableReplacementMap {
    VariableReplacementMap::from_pairs(pairs.iter().map(|(o, n)| (VariableId(*o), VariableId(*n))))
        .unwrap()
}

/// Year ranges from `(variable, min, max)` triples
pub fn year_ranges(entries: &[(i64, i32, i32)]) -> YearRanges {
    entries
        .iter()
        .map(|(v, min, max)| (VariableId(*v), YearRange::new(*min, *max)))
        .collect()
}

/// A staged rewrite of a single-dimension chart from variable 100 to 200
pub fn staged_revision(chart_id: i64, title: &str) -> StagedRevision {
    let original = config_with_dimensions(&[100]);
    let mut suggested = config_with_dimensions(&[200]);
    suggested.title = Some(title.to_string());
    suggested.version = Some(2);
    StagedRevision::new(ChartId(chart_id), original, suggested)
}

/// Insert a chart and the dimension rows mirroring its config
pub fn insert_chart(store: &SqliteStore, chart_id: ChartId, config: &ChartConfig) -> Result<(), StoreError> {
    let conn = store.connection();
    conn.execute(
        "INSERT INTO charts (id, config, createdAt, updatedAt) VALUES (?1, ?2, ?3, ?3)",
        params![chart_id.get(), config.to_json()?, "2024-01-01T00:00:00.000000Z"],
    )?;
    for row in dimension_rows(chart_id, config) {
        conn.execute(
            "INSERT INTO chart_dimensions (id, chartId, variableId, property, \"order\") \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![row.id.get(), row.chart_id.get(), row.variable_id.get(), row.property, row.order],
        )?;
    }
    Ok(())
}

/// Insert one data point at each end of a variable's year range
pub fn insert_data_years(store: &SqliteStore, variable: VariableId, range: YearRange) -> Result<(), StoreError> {
    for year in [range.min, range.max] {
        store.connection().execute(
            "INSERT OR IGNORE INTO data_points (variableId, entityId, year, value) VALUES (?1, 1, ?2, '0')",
            params![variable.get(), year],
        )?;
    }
    Ok(())
}

/// In-memory SQLite store holding `charts` and data years for `ranges`
pub fn seeded_sqlite(charts: &[(ChartId, ChartConfig)], ranges: &YearRanges) -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store.create_tables().unwrap();
    for (chart_id, config) in charts {
        insert_chart(&store, *chart_id, config).unwrap();
    }
    for (variable, range) in ranges {
        insert_data_years(&store, *variable, *range).unwrap();
    }
    store
}

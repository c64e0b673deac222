//! End-to-end storage behaviour against an on-disk SQLite database

use std::collections::BTreeSet;

use chartrev_model::{
    ChartConfig, ChartId, Dimension, RevisionStatus, StagedRevision, UserId, VariableId,
    VariableReplacementMap, YearRange,
};
use chartrev_store::{
    CheckPhase, ChartSelector, ConflictChecker, ConflictError, RevisionStore, SqliteStore,
    SuggestionWriter, WriteError, WriteOutcome, YearRangeResolver,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SEED: &str = r#"
INSERT INTO charts (id, config) VALUES
    (1, '{"title":"Life expectancy","dimensions":[{"variableId":100,"property":"y"},{"variableId":500,"property":"x"}]}'),
    (2, '{"map":{"variableId":101,"targetYear":2000}}'),
    (3, '{"dimensions":[{"variableId":500,"property":"y"}]}'),
    (4, '{"dimensions":[{"variableId":100,"property":"y"}],"map":{"variableId":100}}'),
    (5, 'not json');
INSERT INTO chart_dimensions (id, chartId, variableId, property, "order") VALUES
    (11, 1, 500, 'x', 1),
    (10, 1, 100, 'y', 0),
    (30, 3, 500, 'y', 0),
    (40, 4, 100, 'y', 0),
    (50, 5, 100, 'y', 0);
INSERT INTO data_points (variableId, entityId, year, value) VALUES
    (100, 1, 1990, '1'), (100, 1, 2015, '2'),
    (200, 1, 1995, '1'), (200, 1, 2020, '2'),
    (101, 1, 2000, '1');
"#;

fn open_store() -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("charts.db")).unwrap();
    store.create_tables().unwrap();
    store.connection().execute_batch(SEED).unwrap();
    (dir, store)
}

fn replacements() -> VariableReplacementMap {
    VariableReplacementMap::from_json_str(r#"{"100": "200", "101": "201"}"#).unwrap()
}

fn staged(chart: i64, title: &str) -> StagedRevision {
    let original = ChartConfig {
        dimensions: Some(vec![Dimension::new(VariableId(100), "y", 0)]),
        ..ChartConfig::default()
    };
    let suggested = ChartConfig {
        title: Some(title.to_string()),
        dimensions: Some(vec![Dimension::new(VariableId(200), "y", 0)]),
        version: Some(2),
        ..ChartConfig::default()
    };
    StagedRevision::new(ChartId(chart), original, suggested)
}

fn active_count(store: &SqliteStore) -> usize {
    store.list_active_revisions().unwrap().len()
}

#[test]
fn selector_returns_dimension_and_map_charts() {
    let (_dir, store) = open_store();

    let selection = ChartSelector::new(&store).select(&replacements()).unwrap();

    let ids: Vec<_> = selection.charts.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec![ChartId(1), ChartId(2), ChartId(4)]);
    assert_eq!(selection.unreadable.len(), 1);
    assert_eq!(selection.unreadable[0].0, ChartId(5));
    assert_eq!(selection.matched(), 4);

    // every row of the chart, sorted by order, not just the matching one
    let orders: Vec<_> = selection.charts[0].rows.iter().map(|r| r.order).collect();
    assert_eq!(orders, vec![0, 1]);
}

#[test]
fn year_ranges_cover_old_and_new_ids() {
    let (_dir, store) = open_store();

    let ranges = YearRangeResolver::new(&store)
        .resolve_for(&replacements())
        .unwrap();

    assert_eq!(ranges.get(&VariableId(100)), Some(&YearRange::new(1990, 2015)));
    assert_eq!(ranges.get(&VariableId(200)), Some(&YearRange::new(1995, 2020)));
    assert_eq!(ranges.get(&VariableId(101)), Some(&YearRange::new(2000, 2000)));
    assert_eq!(ranges.get(&VariableId(201)), None);
}

#[test]
fn batch_commits_every_row_as_pending() {
    let (_dir, mut store) = open_store();
    let writer = SuggestionWriter::new("wdi (v2) bulk dataset update", UserId(7));

    let outcome = writer
        .write(&mut store, &[staged(1, "a"), staged(4, "b")])
        .unwrap();

    assert_eq!(outcome.committed(), 2);
    let statuses: Vec<(i64, String, String, i64)> = store
        .connection()
        .prepare("SELECT chartId, status, suggestedReason, createdBy FROM suggested_chart_revisions ORDER BY chartId")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        statuses,
        vec![
            (1, "pending".to_string(), "wdi (v2) bulk dataset update".to_string(), 7),
            (4, "pending".to_string(), "wdi (v2) bulk dataset update".to_string(), 7),
        ]
    );
}

#[test]
fn existing_active_suggestion_fails_the_whole_batch() {
    let (_dir, mut store) = open_store();
    let writer = SuggestionWriter::new("first", UserId(1));
    writer.write(&mut store, &[staged(4, "first")]).unwrap();

    let err = writer
        .write(&mut store, &[staged(1, "second"), staged(4, "second")])
        .unwrap_err();

    assert!(matches!(
        err,
        WriteError::Conflict {
            attempted: 2,
            source: ConflictError::AlreadyStaged(_)
        }
    ));
    let report = err.conflict_report().unwrap();
    assert_eq!(report.phase, CheckPhase::BeforeWrite);
    assert_eq!(report.chart_ids().collect::<Vec<_>>(), vec![ChartId(4)]);
    // chart 1 was not written either
    assert_eq!(active_count(&store), 1);
}

#[test]
fn reviewed_suggestions_do_not_block() {
    let (_dir, mut store) = open_store();
    let writer = SuggestionWriter::new("first", UserId(1));
    writer.write(&mut store, &[staged(4, "first")]).unwrap();
    store
        .connection()
        .execute(
            "UPDATE suggested_chart_revisions SET status = ?1",
            [RevisionStatus::Approved.as_str()],
        )
        .unwrap();

    let outcome = writer.write(&mut store, &[staged(4, "second")]).unwrap();

    assert_eq!(outcome.committed(), 1);
}

#[test]
fn exact_duplicate_in_batch_is_benign_and_rolls_back() {
    let (_dir, mut store) = open_store();
    let writer = SuggestionWriter::new("dup", UserId(1));

    let outcome = writer
        .write(&mut store, &[staged(1, "x"), staged(4, "y"), staged(4, "y")])
        .unwrap();

    assert_eq!(outcome, WriteOutcome::DuplicateRolledBack { attempted: 3 });
    assert_eq!(active_count(&store), 0);
}

#[test]
fn two_different_rows_for_one_chart_fail_post_check() {
    let (_dir, mut store) = open_store();
    let writer = SuggestionWriter::new("twice", UserId(1));

    let err = writer
        .write(&mut store, &[staged(4, "one"), staged(4, "two")])
        .unwrap_err();

    let report = err.conflict_report().unwrap();
    assert_eq!(report.phase, CheckPhase::AfterWrite);
    assert_eq!(report.conflicts[&ChartId(4)].len(), 2);
    assert_eq!(active_count(&store), 0);
}

#[test]
fn audit_lists_charts_with_several_active_rows() {
    let (_dir, mut store) = open_store();
    let writer = SuggestionWriter::new("a", UserId(1));
    writer.write(&mut store, &[staged(1, "a"), staged(4, "a")]).unwrap();
    // a row inserted behind the writer's back
    store
        .connection()
        .execute(
            "INSERT INTO suggested_chart_revisions \
             (chartId, originalConfig, suggestedConfig, status, createdBy, createdAt, updatedAt) \
             VALUES (4, '{}', '{\"title\":\"manual\"}', 'flagged', 2, '2099-01-01T00:00:00.000000Z', '2099-01-01T00:00:00.000000Z')",
            [],
        )
        .unwrap();

    let report = ConflictChecker::new().audit(&store).unwrap();

    assert_eq!(report.chart_ids().collect::<BTreeSet<_>>(), [ChartId(4)].into_iter().collect());
    assert_eq!(report.conflicts[&ChartId(4)].len(), 2);
}

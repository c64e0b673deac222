//! Command line runs against a database on disk

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chartrev_cli::{cli, run, EXIT_BATCH_FAILED};
use chartrev_core::model::{ChartId, TimeBound, VariableId, YearRange};
use chartrev_core::store::SqliteStore;
use chartrev_test_utils::{config_with_dimensions, insert_chart, insert_data_years};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    db: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("charts.db");
        let store = SqliteStore::open(&db).unwrap();
        store.create_tables().unwrap();

        let mut config = config_with_dimensions(&[100]);
        config.min_time = Some(TimeBound::Year(1990));
        config.max_time = Some(TimeBound::Year(2015));
        insert_chart(&store, ChartId(1), &config).unwrap();
        insert_data_years(&store, VariableId(100), YearRange::new(1990, 2015)).unwrap();
        insert_data_years(&store, VariableId(200), YearRange::new(1995, 2020)).unwrap();

        let output = dir.path().join("wdi").join("output");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("variable_replacements.json"), r#"{"100": "200"}"#).unwrap();

        Self { dir, db }
    }

    fn dataset_dir(&self) -> PathBuf {
        self.dir.path().join("wdi")
    }

    fn run(&self, args: &[&str]) -> (ExitCode, String) {
        let db = self.db.to_string_lossy().into_owned();
        let dataset_dir = self.dataset_dir().to_string_lossy().into_owned();
        let mut argv: Vec<String> = vec!["chart-revisions".to_string()];
        for arg in args {
            argv.push(match *arg {
                "$DB" => db.clone(),
                "$DATASET" => dataset_dir.clone(),
                other => other.to_string(),
            });
        }
        let matches = cli::command().try_get_matches_from(argv).unwrap();
        let mut out = Vec::new();
        let code = run(&matches, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }
}

fn pending_rows(db: &Path) -> i64 {
    let store = SqliteStore::open(db).unwrap();
    store
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM suggested_chart_revisions WHERE status = 'pending'",
            [],
            |row| row.get(0),
        )
        .unwrap()
}

#[test]
fn suggest_commits_and_rerun_is_rolled_back() {
    let fixture = Fixture::new();
    let args = [
        "suggest",
        "--db",
        "$DB",
        "--dataset-dir",
        "$DATASET",
        "--dataset",
        "wdi",
        "--dataset-version",
        "3",
    ];

    let (code, out) = fixture.run(&args);
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(out.starts_with("wdi (v3) bulk dataset update"));
    assert!(out.contains("committed 1 suggestion(s)"));
    assert!(out.contains("minTime moved later (1990 -> 1995)"));
    assert_eq!(pending_rows(&fixture.db), 1);

    let (code, out) = fixture.run(&args);
    assert_eq!(code, ExitCode::from(EXIT_BATCH_FAILED));
    assert!(out.contains("pre-check found 1 chart(s) in conflict; chart 1"));
    assert_eq!(pending_rows(&fixture.db), 1);
}

#[test]
fn dry_run_prints_json_report() {
    let fixture = Fixture::new();

    let (code, out) = fixture.run(&[
        "suggest",
        "--db",
        "$DB",
        "--dataset-dir",
        "$DATASET",
        "--reason",
        "manual check",
        "--dry-run",
        "--json",
    ]);

    assert_eq!(code, ExitCode::SUCCESS);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["reason"], "manual check");
    assert_eq!(report["outcome"]["status"], "dry_run");
    assert_eq!(report["staged"], serde_json::json!([1]));
    assert_eq!(pending_rows(&fixture.db), 0);
}

#[test]
fn conflicts_reports_clean_database() {
    let fixture = Fixture::new();

    let (code, out) = fixture.run(&["conflicts", "--db", "$DB"]);

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(out.contains("no chart has more than one active suggestion"));
}

#[test]
fn settings_file_supplies_database_and_dataset() {
    let fixture = Fixture::new();
    let settings = fixture.dir.path().join("chartrev.toml");
    fs::write(
        &settings,
        format!(
            "database = {:?}\n\n[engine]\ndataset = \"wdi\"\ndataset_version = \"9\"\n",
            fixture.db.to_string_lossy()
        ),
    )
    .unwrap();
    let settings = settings.to_string_lossy().into_owned();

    let (code, out) = fixture.run(&["suggest", "--config", settings.as_str(), "--dataset-dir", "$DATASET", "--dry-run"]);

    assert_eq!(code, ExitCode::SUCCESS, "{out}");
    assert!(out.starts_with("wdi (v9) bulk dataset update"));
    assert!(out.contains("dry run, nothing written"));
    assert_eq!(pending_rows(&fixture.db), 0);
}

#[test]
fn missing_replacement_map_is_an_input_error() {
    let fixture = Fixture::new();
    let missing = fixture.dir.path().join("nope.json").to_string_lossy().into_owned();
    let matches = cli::command()
        .try_get_matches_from(["chart-revisions", "suggest", "--db", "x.db", "--dataset", "wdi", "--map", missing.as_str()])
        .unwrap();

    let err = run(&matches, &mut Vec::<u8>::new()).unwrap_err();

    assert!(format!("{err:#}").contains("cannot load replacement map"));
}

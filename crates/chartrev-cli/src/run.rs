//! Subcommand execution

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chartrev_core::model::VariableReplacementMap;
use chartrev_core::store::{ConflictChecker, ConflictReport, SqliteStore};
use chartrev_core::{BatchOutcome, BatchReport, RevisionEngine};
use clap::ArgMatches;
use tracing::{error, info};

use crate::settings::CliConfig;

/// Exit status when a batch was rolled back or conflicts were found
pub const EXIT_BATCH_FAILED: u8 = 2;

/// Dispatch a parsed command line, writing reports to `out`
///
/// # Errors
/// Returns error for invalid input: unreadable settings, replacement map,
/// or database
pub fn run(matches: &ArgMatches, out: &mut impl Write) -> Result<ExitCode> {
    match matches.subcommand() {
        Some(("suggest", args)) => {
            let config = CliConfig::from_matches(args)?.with_suggest_flags(args);
            suggest(&config, args, out)
        }
        Some(("conflicts", args)) => {
            let config = CliConfig::from_matches(args)?;
            conflicts(&config, args.get_flag("json"), out)
        }
        Some((other, _)) => bail!("unknown subcommand {other}"),
        None => bail!("no subcommand given"),
    }
}

fn replacement_path(args: &ArgMatches) -> Result<PathBuf> {
    if let Some(path) = args.get_one::<PathBuf>("map") {
        return Ok(path.clone());
    }
    let dir = args
        .get_one::<PathBuf>("dataset-dir")
        .context("either --map or --dataset-dir is required")?;
    Ok(VariableReplacementMap::conventional_path(dir))
}

fn open_store(config: &CliConfig) -> Result<SqliteStore> {
    let path = config.database()?;
    SqliteStore::open(path).with_context(|| format!("cannot open database {}", path.display()))
}

fn suggest(config: &CliConfig, args: &ArgMatches, out: &mut impl Write) -> Result<ExitCode> {
    let map_path = replacement_path(args)?;
    let map = VariableReplacementMap::from_path(&map_path)
        .with_context(|| format!("cannot load replacement map {}", map_path.display()))?;
    info!(path = %map_path.display(), replacements = map.len(), "replacement map loaded");

    let engine = RevisionEngine::new(config.engine.clone())?;
    let mut store = open_store(config)?;

    match engine.run(&mut store, &map) {
        Ok(report) => {
            if args.get_flag("json") {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                write_summary(&report, out)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_batch_fatal() => {
            error!(error = %err, "batch rolled back");
            if let Some(report) = err.conflict_report() {
                writeln!(out, "{report}")?;
            }
            writeln!(out, "batch rolled back: {err}")?;
            Ok(ExitCode::from(EXIT_BATCH_FAILED))
        }
        Err(err) => Err(err.into()),
    }
}

fn write_summary(report: &BatchReport, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", report.reason)?;
    writeln!(out, "  charts considered: {}", report.charts_considered)?;
    writeln!(out, "  staged:            {}", report.staged.len())?;
    writeln!(out, "  skipped:           {}", report.skipped.len())?;
    writeln!(out, "  warnings:          {}", report.warnings.len())?;
    let outcome = match &report.outcome {
        BatchOutcome::Committed { revision_ids } => {
            format!("committed {} suggestion(s)", revision_ids.len())
        }
        BatchOutcome::DuplicateRolledBack => {
            "rolled back: a suggestion duplicated an existing one".to_string()
        }
        BatchOutcome::DryRun => "dry run, nothing written".to_string(),
        BatchOutcome::NothingToStage => "nothing to stage".to_string(),
    };
    writeln!(out, "  outcome:           {outcome}")?;
    for failure in &report.skipped {
        writeln!(out, "  skipped chart {}: {}", failure.chart_id, failure.cause)?;
    }
    for warning in &report.warnings {
        writeln!(out, "  chart {}: {}", warning.chart_id, warning.warning)?;
    }
    Ok(())
}

fn conflicts(config: &CliConfig, json: bool, out: &mut impl Write) -> Result<ExitCode> {
    let store = open_store(config)?;
    let report: ConflictReport = ConflictChecker::new().audit(&store)?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else if report.is_clear() {
        writeln!(out, "no chart has more than one active suggestion")?;
    } else {
        writeln!(out, "{report}")?;
    }
    Ok(if report.is_clear() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_BATCH_FAILED)
    })
}

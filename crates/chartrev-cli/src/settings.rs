//! Settings file and flag overrides

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chartrev_core::model::UserId;
use chartrev_core::EngineConfig;
use clap::ArgMatches;
use serde::Deserialize;

/// Contents of the `--config` TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// SQLite database path
    pub database: Option<PathBuf>,
    /// Engine settings
    pub engine: EngineConfig,
}

impl CliConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    /// Returns error if the document does not match the settings layout
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid settings file")
    }

    /// Read settings from `path`
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read settings file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Settings from `--config` if given, else defaults, with global flags applied
    ///
    /// # Errors
    /// Returns error if the settings file cannot be loaded
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mut config = match matches.get_one::<PathBuf>("config") {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(db) = matches.get_one::<PathBuf>("db") {
            config.database = Some(db.clone());
        }
        Ok(config)
    }

    /// Apply `suggest` flags on top of the file values
    #[must_use]
    pub fn with_suggest_flags(mut self, args: &ArgMatches) -> Self {
        if let Some(db) = args.get_one::<PathBuf>("db") {
            self.database = Some(db.clone());
        }
        let engine = &mut self.engine;
        if let Some(dataset) = args.get_one::<String>("dataset") {
            engine.dataset = dataset.clone();
        }
        if let Some(version) = args.get_one::<String>("dataset-version") {
            engine.dataset_version = version.clone();
        }
        if let Some(user) = args.get_one::<i64>("user") {
            engine.created_by = UserId(*user);
        }
        if let Some(reason) = args.get_one::<String>("reason") {
            engine.reason = Some(reason.clone());
        }
        if args.get_flag("dry-run") {
            engine.dry_run = true;
        }
        self
    }

    /// Database path, required for every subcommand
    ///
    /// # Errors
    /// Returns error if neither `--db` nor the settings file names one
    pub fn database(&self) -> Result<&Path> {
        self.database
            .as_deref()
            .context("no database given; pass --db or set `database` in the settings file")
    }
}

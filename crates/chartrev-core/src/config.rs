//! Engine configuration

use chartrev_model::UserId;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Settings for one batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Dataset whose import produced the replacement map
    pub dataset: String,
    /// Dataset version, as shown in the reason string
    pub dataset_version: String,
    /// User recorded as author of staged revisions
    pub created_by: UserId,
    /// Replaces the generated reason string
    pub reason: Option<String>,
    /// Compute rewrites without writing anything
    pub dry_run: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With dataset name and version
    #[inline]
    #[must_use]
    pub fn with_dataset(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.dataset = name.into();
        self.dataset_version = version.into();
        self
    }

    /// With author of staged revisions
    #[inline]
    #[must_use]
    pub fn with_created_by(mut self, user: UserId) -> Self {
        self.created_by = user;
        self
    }

    /// With an explicit reason string
    #[inline]
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// With dry-run mode
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Reason attached to every staged revision
    #[must_use]
    pub fn reason(&self) -> String {
        match &self.reason {
            Some(reason) => reason.clone(),
            None => format!("{} (v{}) bulk dataset update", self.dataset, self.dataset_version),
        }
    }

    /// Check the settings can produce a meaningful batch
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] if the dataset name is missing without
    /// a reason override, or the author id is not positive
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.reason.is_none() && self.dataset.trim().is_empty() {
            return Err(EngineError::Config(
                "dataset name is required when no reason is given".to_string(),
            ));
        }
        if self.created_by.get() <= 0 {
            return Err(EngineError::Config(format!(
                "created_by must be a positive user id, got {}",
                self.created_by
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dataset: String::new(),
            dataset_version: "1".to_string(),
            created_by: UserId(1),
            reason: None,
            dry_run: false,
        }
    }
}

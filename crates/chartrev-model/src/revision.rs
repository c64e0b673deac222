//! Suggested chart revisions
//!
//! Rows of `suggested_chart_revisions`. This crate's engine only ever creates
//! them as [`RevisionStatus::Pending`]; the other states are set by the
//! external review tool.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chart::ChartConfig;
use crate::error::ModelError;
use crate::ids::{ChartId, RevisionId, UserId};

/// Review state of a suggested revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    Pending,
    Approved,
    Rejected,
    Flagged,
}

impl RevisionStatus {
    /// States that block staging another revision for the same chart
    pub const ACTIVE: [RevisionStatus; 2] = [RevisionStatus::Pending, RevisionStatus::Flagged];

    /// Whether the revision still awaits a review decision
    #[inline]
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Flagged)
    }

    /// Stored string form
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Flagged => "flagged",
        }
    }
}

impl fmt::Display for RevisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevisionStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "flagged" => Ok(Self::Flagged),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

/// A full `suggested_chart_revisions` row
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedRevision {
    pub id: RevisionId,
    pub chart_id: ChartId,
    pub original_config: ChartConfig,
    pub suggested_config: ChartConfig,
    pub suggested_reason: String,
    pub status: RevisionStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to the suggestion writer: one rewrite ready to be staged
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRevision {
    pub chart_id: ChartId,
    pub original_config: ChartConfig,
    pub suggested_config: ChartConfig,
}

impl StagedRevision {
    /// Create staged revision
    #[inline]
    #[must_use]
    pub fn new(chart_id: ChartId, original_config: ChartConfig, suggested_config: ChartConfig) -> Self {
        Self {
            chart_id,
            original_config,
            suggested_config,
        }
    }
}

/// The columns the conflict check needs from an active revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRevision {
    pub id: RevisionId,
    pub chart_id: ChartId,
    pub status: RevisionStatus,
    pub created_at: DateTime<Utc>,
}

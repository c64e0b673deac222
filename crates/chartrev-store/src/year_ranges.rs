//! Data-year lookup per variable

use std::collections::BTreeSet;

use chartrev_model::{VariableId, VariableReplacementMap, YearRanges};
use tracing::debug;

use crate::error::StoreError;
use crate::repository::ChartRepository;

/// Resolves min/max data years for variables
#[derive(Debug, Clone, Copy)]
pub struct YearRangeResolver<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R: ChartRepository + ?Sized> YearRangeResolver<'a, R> {
    /// Create resolver over a repository
    #[inline]
    #[must_use]
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Ranges for the given ids; ids without data points are simply absent
    ///
    /// # Errors
    /// Returns error if the backend query fails
    pub fn resolve(&self, ids: &BTreeSet<VariableId>) -> Result<YearRanges, StoreError> {
        let ranges = self.repo.year_ranges(ids)?;
        let missing: Vec<_> = ids.iter().filter(|id| !ranges.contains_key(id)).collect();
        if !missing.is_empty() {
            debug!(?missing, "variables without data points");
        }
        Ok(ranges)
    }

    /// Ranges for every old and new id of a replacement map
    ///
    /// # Errors
    /// Returns error if the backend query fails
    pub fn resolve_for(&self, map: &VariableReplacementMap) -> Result<YearRanges, StoreError> {
        self.resolve(&map.all_ids())
    }
}

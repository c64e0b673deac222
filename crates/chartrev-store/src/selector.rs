//! Chart selection
//!
//! Finds every chart that plots an old variable as a dimension or shows it
//! on the map layer, together with the chart's complete dimension rows.

use std::collections::{BTreeMap, BTreeSet};

use chartrev_model::{Chart, ChartDimensionRow, ChartId, ModelError, VariableReplacementMap};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::repository::ChartRepository;

/// A chart with at least one rewritable reference
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedChart {
    pub chart: Chart,
    /// Every dimension row of the chart, ordered by `order`
    pub rows: Vec<ChartDimensionRow>,
}

impl SelectedChart {
    /// Chart id
    #[inline]
    #[must_use]
    pub fn id(&self) -> ChartId {
        self.chart.id
    }
}

/// Selector result
#[derive(Debug, Default)]
pub struct Selection {
    /// Selected charts in id order
    pub charts: Vec<SelectedChart>,
    /// Matching charts whose stored config could not be parsed
    pub unreadable: Vec<(ChartId, ModelError)>,
}

impl Selection {
    /// Number of charts that matched, readable or not
    #[must_use]
    pub fn matched(&self) -> usize {
        self.charts.len() + self.unreadable.len()
    }
}

/// Finds charts referencing replaced variables
#[derive(Debug, Clone, Copy)]
pub struct ChartSelector<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R: ChartRepository + ?Sized> ChartSelector<'a, R> {
    /// Create selector over a repository
    #[inline]
    #[must_use]
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Charts whose dimension rows or map layer use an old id of `map`
    ///
    /// # Errors
    /// Returns error if a backend query fails. Unparseable configs are
    /// collected in [`Selection::unreadable`] instead.
    pub fn select(&self, map: &VariableReplacementMap) -> Result<Selection, StoreError> {
        let old_ids: BTreeSet<_> = map.old_ids().collect();
        if old_ids.is_empty() {
            return Ok(Selection::default());
        }

        let mut chart_ids: BTreeSet<ChartId> = self
            .repo
            .dimensions_by_variables(&old_ids)?
            .into_iter()
            .map(|row| row.chart_id)
            .collect();
        let by_dimension = chart_ids.len();
        chart_ids.extend(self.repo.chart_ids_by_map_variables(&old_ids)?);
        debug!(
            by_dimension,
            total = chart_ids.len(),
            "candidate charts"
        );
        if chart_ids.is_empty() {
            return Ok(Selection::default());
        }

        let mut rows_by_chart: BTreeMap<ChartId, Vec<ChartDimensionRow>> = BTreeMap::new();
        for row in self.repo.dimensions_by_charts(&chart_ids)? {
            rows_by_chart.entry(row.chart_id).or_default().push(row);
        }

        let mut selection = Selection::default();
        for record in self.repo.charts_by_ids(&chart_ids)? {
            let chart = match record.parse() {
                Ok(chart) => chart,
                Err(err) => {
                    warn!(chart_id = %record.id, error = %err, "unreadable chart config");
                    selection.unreadable.push((record.id, err));
                    continue;
                }
            };
            let mut rows = rows_by_chart.remove(&chart.id).unwrap_or_default();
            rows.sort_by_key(|row| row.order);

            let rewritable = rows.iter().any(|row| map.replaces(row.variable_id))
                || chart
                    .config
                    .map
                    .as_ref()
                    .and_then(|layer| layer.variable_id)
                    .is_some_and(|id| map.replaces(id));
            if rewritable {
                selection.charts.push(SelectedChart { chart, rows });
            } else {
                debug!(chart_id = %chart.id, "no rewritable reference");
            }
        }
        Ok(selection)
    }
}

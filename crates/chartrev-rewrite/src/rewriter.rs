//! Config rewriter
//!
//! Pure function of (chart, rows, replacement map, year ranges). No IO, no
//! logging: warnings come back as data on [`RewriteOutcome`].

use chartrev_model::{
    ChartConfig, ChartDimensionRow, ChartId, VariableId, VariableReplacementMap, YearRanges,
};

use crate::error::RewriteError;
use crate::passes;
use crate::warning::RewriteWarning;

/// Result of rewriting one chart
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOutcome {
    /// Chart the rewrite belongs to
    pub chart_id: ChartId,
    /// Rewritten config
    pub config: ChartConfig,
    /// Rewritten dimension rows, same order as the input
    pub dimension_rows: Vec<ChartDimensionRow>,
    /// Advisory findings
    pub warnings: Vec<RewriteWarning>,
    /// At least one dimension row was substituted
    pub changed: bool,
    original: ChartConfig,
}

impl RewriteOutcome {
    /// Config as it was before the rewrite
    #[inline]
    #[must_use]
    pub fn original_config(&self) -> &ChartConfig {
        &self.original
    }

    /// Whether the rewritten config differs from the original.
    ///
    /// Differs from [`RewriteOutcome::changed`] for charts that reference a
    /// replaced variable only through the map layer.
    #[inline]
    #[must_use]
    pub fn config_changed(&self) -> bool {
        self.config != self.original
    }
}

/// Rewrites chart configs for one replacement map
///
/// # Example
///
/// ```rust,ignore
/// let rewriter = ConfigRewriter::new(&replacements, &year_ranges);
/// let outcome = rewriter.rewrite(chart.id, &chart.config, &rows)?;
/// if outcome.config_changed() {
///     staged.push(outcome.config);
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConfigRewriter<'a> {
    replacements: &'a VariableReplacementMap,
    year_ranges: &'a YearRanges,
}

impl<'a> ConfigRewriter<'a> {
    /// Create rewriter
    #[inline]
    #[must_use]
    pub fn new(replacements: &'a VariableReplacementMap, year_ranges: &'a YearRanges) -> Self {
        Self {
            replacements,
            year_ranges,
        }
    }

    /// Rewrite one chart
    ///
    /// Runs the map, time-window, text, and dimension passes, then checks
    /// that the `changed` flag agrees with the rows.
    ///
    /// # Errors
    /// Returns [`RewriteError`] when rows and config are out of sync or the
    /// lockstep check fails. Nothing partial is returned in that case.
    pub fn rewrite(
        &self,
        chart_id: ChartId,
        config: &ChartConfig,
        rows: &[ChartDimensionRow],
    ) -> Result<RewriteOutcome, RewriteError> {
        passes::check_mirror(chart_id, config, rows)?;

        let replaced = self.replaced_variables(config, rows);
        let mut new_config = config.clone();
        let mut new_rows = rows.to_vec();
        let mut warnings = Vec::new();

        passes::rewrite_map(&mut new_config, self.replacements, self.year_ranges, &mut warnings);
        let reported = passes::rewrite_time_window(
            &mut new_config,
            &replaced,
            self.replacements,
            self.year_ranges,
            &mut warnings,
        );
        passes::scan_text_fields(&new_config, reported, &mut warnings);
        let changed =
            passes::rewrite_dimensions(chart_id, &mut new_config, &mut new_rows, self.replacements)?;

        let rows_changed = new_rows.iter().zip(rows).any(|(new, old)| new != old);
        if changed != rows_changed {
            return Err(RewriteError::LockstepViolation {
                chart_id,
                flagged: changed,
                rows_changed,
            });
        }

        Ok(RewriteOutcome {
            chart_id,
            config: new_config,
            dimension_rows: new_rows,
            warnings,
            changed,
            original: config.clone(),
        })
    }

    /// Old ids this chart actually references, via rows, dimensions, or the map
    fn replaced_variables(&self, config: &ChartConfig, rows: &[ChartDimensionRow]) -> Vec<VariableId> {
        let mut ids: Vec<VariableId> = config
            .referenced_variables()
            .into_iter()
            .chain(rows.iter().map(|r| r.variable_id))
            .filter(|id| self.replacements.replaces(*id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

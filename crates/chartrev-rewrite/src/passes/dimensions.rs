//! Dimension pass
//!
//! Rows and `config.dimensions` are rewritten in lockstep: a row's `order`
//! matches the `order` of its mirror entry in the config, which falls back to
//! the entry's list index when the config omits it.

use std::collections::BTreeSet;

use chartrev_model::{ChartConfig, ChartDimensionRow, ChartId, Dimension, VariableId, VariableReplacementMap};

use crate::error::RewriteError;

/// Reject rows that do not mirror the config before anything is touched
pub(crate) fn check_mirror(
    chart_id: ChartId,
    config: &ChartConfig,
    rows: &[ChartDimensionRow],
) -> Result<(), RewriteError> {
    let from_rows: BTreeSet<(VariableId, u32)> =
        rows.iter().map(|r| (r.variable_id, r.order)).collect();
    let from_config: BTreeSet<(VariableId, u32)> = config
        .dimensions
        .iter()
        .flatten()
        .enumerate()
        .filter_map(|(index, d)| entry_order(index, d).map(|order| (d.variable_id, order)))
        .collect();

    if from_rows == from_config {
        Ok(())
    } else {
        Err(RewriteError::DimensionsOutOfSync {
            chart_id,
            rows: from_rows.into_iter().collect(),
            config: from_config.into_iter().collect(),
        })
    }
}

/// Declared `order` of a config entry, or its position when undeclared
fn entry_order(index: usize, dimension: &Dimension) -> Option<u32> {
    dimension.order.or_else(|| u32::try_from(index).ok())
}

/// Substitute replaced ids; returns whether any substitution happened
pub(crate) fn rewrite_dimensions(
    chart_id: ChartId,
    config: &mut ChartConfig,
    rows: &mut [ChartDimensionRow],
    replacements: &VariableReplacementMap,
) -> Result<bool, RewriteError> {
    let mut changed = false;

    for row in rows.iter_mut() {
        let Some(new_id) = replacements.get(row.variable_id) else {
            continue;
        };

        let dimensions = config.dimensions.get_or_insert_with(Vec::new);
        let len = dimensions.len();
        let entry = dimensions
            .iter_mut()
            .enumerate()
            .find(|(index, d)| entry_order(*index, d) == Some(row.order))
            .map(|(_, d)| d)
            .ok_or(RewriteError::DimensionOrderOutOfRange {
                chart_id,
                order: row.order,
                len,
            })?;

        entry.variable_id = new_id;
        row.variable_id = new_id;
        changed = true;
    }

    Ok(changed)
}

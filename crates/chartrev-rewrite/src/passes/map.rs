//! Map layer pass
//!
//! Substitutes `map.variableId` and re-anchors `map.targetYear` / `map.time`.
//! A year that sat exactly on the old variable's first year moves to the new
//! variable's first year; any other year moves to the new variable's last year.

use chartrev_model::{ChartConfig, TimeBound, VariableReplacementMap, YearRange, YearRanges};

use crate::warning::RewriteWarning;

pub(crate) fn rewrite_map(
    config: &mut ChartConfig,
    replacements: &VariableReplacementMap,
    year_ranges: &YearRanges,
    warnings: &mut Vec<RewriteWarning>,
) {
    let Some(layer) = config.map.as_mut() else {
        return;
    };
    let Some(old_id) = layer.variable_id else {
        return;
    };
    let Some(new_id) = replacements.get(old_id) else {
        return;
    };

    layer.variable_id = Some(new_id);

    let old_range = year_ranges.get(&old_id).copied();
    let Some(new_range) = year_ranges.get(&new_id).copied() else {
        if layer.target_year.is_some() || matches!(layer.time, Some(TimeBound::Year(_))) {
            warnings.push(RewriteWarning::MissingReplacementData {
                variables: vec![new_id],
            });
        }
        return;
    };

    if let Some(year) = layer.target_year {
        layer.target_year = Some(anchor_year(year, old_range, new_range));
    }
    if let Some(TimeBound::Year(year)) = layer.time {
        layer.time = Some(TimeBound::Year(anchor_year(year, old_range, new_range)));
    }
}

fn anchor_year(current: i32, old: Option<YearRange>, new: YearRange) -> i32 {
    match old {
        Some(old) if old.min == current => new.min,
        _ => new.max,
    }
}

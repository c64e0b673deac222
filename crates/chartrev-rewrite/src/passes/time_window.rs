//! Time window pass (`minTime` / `maxTime`)
//!
//! Bounds are moved from the aggregate year range of the replaced variables
//! to the aggregate year range of their replacements.
//!
//! Three cases, checked in order:
//! 1. a window bound is written into the title or subtitle: leave the window
//!    alone and warn
//! 2. the window is a single pinned point: move both bounds to whichever new
//!    bound corresponds to the old bound nearest the pinned year
//! 3. otherwise: numeric bounds move independently, sentinels stay, and a
//!    new data range that starts later or ends earlier than the old one warns

use chartrev_model::{ChartConfig, TimeBound, VariableId, VariableReplacementMap, YearRange, YearRanges};

use super::text::{field_text, mentions_number};
use crate::warning::{RewriteWarning, TextField, WindowBound};

/// Which new bound a pinned window moves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Min,
    Max,
}

/// Rewrite the window; returns the text field the hard-coded-year guard
/// reported, if it fired.
pub(crate) fn rewrite_time_window(
    config: &mut ChartConfig,
    replaced: &[VariableId],
    replacements: &VariableReplacementMap,
    year_ranges: &YearRanges,
    warnings: &mut Vec<RewriteWarning>,
) -> Option<TextField> {
    if config.min_time.is_none() && config.max_time.is_none() {
        return None;
    }
    if replaced.is_empty() {
        return None;
    }

    if let Some(warning) = hard_coded_year(config) {
        let field = warning.text_field();
        warnings.push(warning);
        return field;
    }

    let old = aggregate(replaced.iter().copied(), year_ranges);
    let new_ids: Vec<VariableId> = replaced
        .iter()
        .filter_map(|id| replacements.get(*id))
        .collect();
    let Some(new) = aggregate(new_ids.iter().copied(), year_ranges) else {
        warnings.push(RewriteWarning::MissingReplacementData { variables: new_ids });
        return None;
    };

    if let Some(pinned) = pinned_point(config.min_time, config.max_time, old) {
        let year = match closer_anchor(pinned, old) {
            Anchor::Min => new.min,
            Anchor::Max => new.max,
        };
        config.min_time = Some(TimeBound::Year(year));
        config.max_time = Some(TimeBound::Year(year));
        return None;
    }

    if matches!(config.min_time, Some(TimeBound::Year(_))) {
        config.min_time = Some(TimeBound::Year(new.min));
        if let Some(old) = old.filter(|old| new.min > old.min) {
            warnings.push(RewriteWarning::LowerBoundMovedLater {
                old: old.min,
                new: new.min,
            });
        }
    }
    if matches!(config.max_time, Some(TimeBound::Year(_))) {
        config.max_time = Some(TimeBound::Year(new.max));
        if let Some(old) = old.filter(|old| new.max < old.max) {
            warnings.push(RewriteWarning::UpperBoundMovedEarlier {
                old: old.max,
                new: new.max,
            });
        }
    }

    None
}

/// First numeric window bound found verbatim in the title or subtitle
fn hard_coded_year(config: &ChartConfig) -> Option<RewriteWarning> {
    let bounds = [
        (WindowBound::MinTime, config.min_time),
        (WindowBound::MaxTime, config.max_time),
    ];
    for field in [TextField::Title, TextField::Subtitle] {
        let Some(text) = field_text(config, field) else {
            continue;
        };
        for (bound, value) in bounds {
            if let Some(year) = value.and_then(TimeBound::year) {
                if mentions_number(text, year) {
                    return Some(RewriteWarning::HardCodedYear { field, bound, year });
                }
            }
        }
    }
    None
}

/// Smallest min and largest max over the variables that have data
fn aggregate(ids: impl Iterator<Item = VariableId>, year_ranges: &YearRanges) -> Option<YearRange> {
    ids.filter_map(|id| year_ranges.get(&id).copied())
        .reduce(|acc, range| YearRange::new(acc.min.min(range.min), acc.max.max(range.max)))
}

/// The single year a window is pinned to, if it is a point
///
/// Equal bounds are a point, including two equal sentinels. A sentinel paired
/// with a year is a point when the year is the old bound the sentinel tracks
/// (`earliest` -> old min, `latest` -> old max).
fn pinned_point(
    min_time: Option<TimeBound>,
    max_time: Option<TimeBound>,
    old: Option<YearRange>,
) -> Option<TimeBound> {
    let (min_time, max_time) = (min_time?, max_time?);
    match (min_time, max_time) {
        (a, b) if a == b => Some(a),
        (TimeBound::Earliest, TimeBound::Year(v)) | (TimeBound::Year(v), TimeBound::Earliest)
            if old.is_some_and(|r| r.min == v) =>
        {
            Some(TimeBound::Year(v))
        }
        (TimeBound::Latest, TimeBound::Year(v)) | (TimeBound::Year(v), TimeBound::Latest)
            if old.is_some_and(|r| r.max == v) =>
        {
            Some(TimeBound::Year(v))
        }
        _ => None,
    }
}

/// Old bound nearest the pinned year; ties, sentinels, and unknown old ranges go to the minimum
fn closer_anchor(pinned: TimeBound, old: Option<YearRange>) -> Anchor {
    match (pinned.year(), old) {
        (Some(year), Some(old)) => {
            let to_min = (i64::from(year) - i64::from(old.min)).abs();
            let to_max = (i64::from(old.max) - i64::from(year)).abs();
            if to_min <= to_max {
                Anchor::Min
            } else {
                Anchor::Max
            }
        }
        _ => Anchor::Min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn setup() -> (VariableReplacementMap, YearRanges) {
        let map = VariableReplacementMap::from_pairs([
            (VariableId(100), VariableId(200)),
            (VariableId(101), VariableId(201)),
        ])
        .unwrap();
        let mut ranges = YearRanges::new();
        ranges.insert(VariableId(100), YearRange::new(1990, 2015));
        ranges.insert(VariableId(200), YearRange::new(1995, 2020));
        ranges.insert(VariableId(101), YearRange::new(1980, 2010));
        ranges.insert(VariableId(201), YearRange::new(1985, 2021));
        (map, ranges)
    }

    fn window(min: TimeBound, max: TimeBound) -> ChartConfig {
        ChartConfig {
            min_time: Some(min),
            max_time: Some(max),
            ..ChartConfig::default()
        }
    }

    fn run(config: &mut ChartConfig, replaced: &[VariableId]) -> (Vec<RewriteWarning>, Option<TextField>) {
        let (map, ranges) = setup();
        let mut warnings = Vec::new();
        let flagged = rewrite_time_window(config, replaced, &map, &ranges, &mut warnings);
        (warnings, flagged)
    }

    #[test]
    fn independent_bounds_move_with_drift_warning() {
        let mut config = window(TimeBound::Year(1990), TimeBound::Year(2015));

        let (warnings, flagged) = run(&mut config, &[VariableId(100)]);

        assert_eq!(config.min_time, Some(TimeBound::Year(1995)));
        assert_eq!(config.max_time, Some(TimeBound::Year(2020)));
        assert_eq!(
            warnings,
            vec![RewriteWarning::LowerBoundMovedLater { old: 1990, new: 1995 }]
        );
        assert_eq!(flagged, None);
    }

    #[test]
    fn upper_bound_moving_earlier_warns() {
        let (map, mut ranges) = setup();
        ranges.insert(VariableId(200), YearRange::new(1985, 2012));
        let mut config = window(TimeBound::Year(1990), TimeBound::Year(2015));
        let mut warnings = Vec::new();

        rewrite_time_window(&mut config, &[VariableId(100)], &map, &ranges, &mut warnings);

        assert_eq!(config.min_time, Some(TimeBound::Year(1985)));
        assert_eq!(config.max_time, Some(TimeBound::Year(2012)));
        assert_eq!(
            warnings,
            vec![RewriteWarning::UpperBoundMovedEarlier { old: 2015, new: 2012 }]
        );
    }

    #[test]
    fn sentinels_are_untouched() {
        let mut config = window(TimeBound::Earliest, TimeBound::Year(2010));

        run(&mut config, &[VariableId(100)]);

        assert_eq!(config.min_time, Some(TimeBound::Earliest));
        assert_eq!(config.max_time, Some(TimeBound::Year(2020)));
    }

    #[test]
    fn two_equal_sentinels_pin_to_new_min() {
        for sentinel in [TimeBound::Latest, TimeBound::Earliest] {
            let mut config = window(sentinel, sentinel);

            let (warnings, _) = run(&mut config, &[VariableId(100)]);

            assert_eq!(config.min_time, Some(TimeBound::Year(1995)));
            assert_eq!(config.max_time, Some(TimeBound::Year(1995)));
            assert!(warnings.is_empty());
        }
    }

    #[test]
    fn mixed_sentinels_are_not_a_point() {
        let mut config = window(TimeBound::Earliest, TimeBound::Latest);

        run(&mut config, &[VariableId(100)]);

        assert_eq!(config.min_time, Some(TimeBound::Earliest));
        assert_eq!(config.max_time, Some(TimeBound::Latest));
    }

    #[test]
    fn drift_is_measured_against_old_data_range() {
        // old data 1990..2015, new data 1995..2020
        let mut config = window(TimeBound::Year(2000), TimeBound::Year(2010));

        let (warnings, _) = run(&mut config, &[VariableId(100)]);

        assert_eq!(config.min_time, Some(TimeBound::Year(1995)));
        assert_eq!(config.max_time, Some(TimeBound::Year(2020)));
        assert_eq!(
            warnings,
            vec![RewriteWarning::LowerBoundMovedLater { old: 1990, new: 1995 }]
        );
    }

    #[test]
    fn widened_data_range_does_not_warn_for_hand_set_window() {
        let (map, mut ranges) = setup();
        ranges.insert(VariableId(200), YearRange::new(1985, 2020));
        let mut config = window(TimeBound::Year(1980), TimeBound::Year(2015));
        let mut warnings = Vec::new();

        rewrite_time_window(&mut config, &[VariableId(100)], &map, &ranges, &mut warnings);

        assert_eq!(config.min_time, Some(TimeBound::Year(1985)));
        assert_eq!(config.max_time, Some(TimeBound::Year(2020)));
        assert!(warnings.is_empty());
    }

    #[test]
    fn aggregate_spans_all_replaced_variables() {
        let mut config = window(TimeBound::Year(1980), TimeBound::Year(2015));

        run(&mut config, &[VariableId(100), VariableId(101)]);

        assert_eq!(config.min_time, Some(TimeBound::Year(1985)));
        assert_eq!(config.max_time, Some(TimeBound::Year(2021)));
    }

    #[test]
    fn pinned_point_near_max_moves_to_new_max() {
        let mut config = window(TimeBound::Year(2015), TimeBound::Year(2015));

        let (warnings, _) = run(&mut config, &[VariableId(100)]);

        assert_eq!(config.min_time, Some(TimeBound::Year(2020)));
        assert_eq!(config.max_time, Some(TimeBound::Year(2020)));
        assert!(warnings.is_empty());
    }

    #[test]
    fn pinned_point_near_min_moves_to_new_min() {
        let mut config = window(TimeBound::Year(1991), TimeBound::Year(1991));

        run(&mut config, &[VariableId(100)]);

        assert_eq!(config.min_time, Some(TimeBound::Year(1995)));
        assert_eq!(config.max_time, Some(TimeBound::Year(1995)));
    }

    #[test]
    fn pinned_point_tie_goes_to_min() {
        // 1990..2016: 2003 is 13 years from either end
        let (map, mut ranges) = setup();
        ranges.insert(VariableId(100), YearRange::new(1990, 2016));
        let mut config = window(TimeBound::Year(2003), TimeBound::Year(2003));

        rewrite_time_window(&mut config, &[VariableId(100)], &map, &ranges, &mut Vec::new());

        assert_eq!(config.min_time, Some(TimeBound::Year(1995)));
        assert_eq!(config.max_time, Some(TimeBound::Year(1995)));
    }

    #[test]
    fn latest_paired_with_old_max_is_pinned() {
        let mut config = window(TimeBound::Latest, TimeBound::Year(2015));

        run(&mut config, &[VariableId(100)]);

        assert_eq!(config.min_time, Some(TimeBound::Year(2020)));
        assert_eq!(config.max_time, Some(TimeBound::Year(2020)));
    }

    #[test]
    fn earliest_paired_with_old_min_is_pinned() {
        let mut config = window(TimeBound::Year(1990), TimeBound::Earliest);

        run(&mut config, &[VariableId(100)]);

        assert_eq!(config.min_time, Some(TimeBound::Year(1995)));
        assert_eq!(config.max_time, Some(TimeBound::Year(1995)));
    }

    #[test]
    fn hard_coded_title_year_skips_pass() {
        let mut config = window(TimeBound::Year(2015), TimeBound::Year(2015));
        config.title = Some("GDP growth in 2015".to_string());
        let before = config.clone();

        let (warnings, flagged) = run(&mut config, &[VariableId(100)]);

        assert_eq!(config, before);
        assert_eq!(flagged, Some(TextField::Title));
        assert_eq!(
            warnings,
            vec![RewriteWarning::HardCodedYear {
                field: TextField::Title,
                bound: WindowBound::MinTime,
                year: 2015,
            }]
        );
    }

    #[test]
    fn hard_coded_subtitle_max_year_skips_pass() {
        let mut config = window(TimeBound::Year(1990), TimeBound::Year(2015));
        config.subtitle = Some("Values up to 2015".to_string());

        let (warnings, flagged) = run(&mut config, &[VariableId(100)]);

        assert_eq!(config.min_time, Some(TimeBound::Year(1990)));
        assert_eq!(flagged, Some(TextField::Subtitle));
        assert!(matches!(
            warnings.as_slice(),
            [RewriteWarning::HardCodedYear { bound: WindowBound::MaxTime, year: 2015, .. }]
        ));
    }

    #[test]
    fn nothing_replaced_is_a_no_op() {
        let mut config = window(TimeBound::Year(1990), TimeBound::Year(2015));
        let before = config.clone();

        let (warnings, _) = run(&mut config, &[]);

        assert_eq!(config, before);
        assert!(warnings.is_empty());
    }

    #[test]
    fn replacements_without_data_warn() {
        let (map, mut ranges) = setup();
        ranges.remove(&VariableId(200));
        let mut config = window(TimeBound::Year(1990), TimeBound::Year(2015));
        let before = config.clone();
        let mut warnings = Vec::new();

        rewrite_time_window(&mut config, &[VariableId(100)], &map, &ranges, &mut warnings);

        assert_eq!(config, before);
        assert_eq!(
            warnings,
            vec![RewriteWarning::MissingReplacementData {
                variables: vec![VariableId(200)]
            }]
        );
    }
}

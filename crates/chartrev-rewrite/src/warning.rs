//! Advisory warnings produced by a rewrite
//!
//! Warnings are returned as data so the rewriter stays free of logging.

use std::fmt;

use chartrev_model::VariableId;
use serde::Serialize;

/// Free-text config field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextField {
    Title,
    Subtitle,
    Note,
    Slug,
}

impl TextField {
    /// Every scanned field, in scan order
    pub const ALL: [TextField; 4] = [Self::Title, Self::Subtitle, Self::Note, Self::Slug];

    /// Config key of the field
    #[inline]
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::Note => "note",
            Self::Slug => "slug",
        }
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which bound of the time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowBound {
    MinTime,
    MaxTime,
}

impl fmt::Display for WindowBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinTime => f.write_str("minTime"),
            Self::MaxTime => f.write_str("maxTime"),
        }
    }
}

/// Advisory finding attached to a rewrite result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewriteWarning {
    /// `minTime`/`maxTime` value is written into a title; the time window was left alone
    HardCodedYear {
        field: TextField,
        bound: WindowBound,
        year: i32,
    },

    /// `minTime` moved later: the chart may show fewer years
    LowerBoundMovedLater { old: i32, new: i32 },

    /// `maxTime` moved earlier: the chart may show fewer years
    UpperBoundMovedEarlier { old: i32, new: i32 },

    /// Replacement variables have no data points, so years could not be re-anchored
    MissingReplacementData { variables: Vec<VariableId> },

    /// A free-text field mentions a year; it is never rewritten
    YearInText { field: TextField, years: Vec<String> },
}

impl RewriteWarning {
    /// The text field a warning refers to, if any
    #[must_use]
    pub fn text_field(&self) -> Option<TextField> {
        match self {
            Self::HardCodedYear { field, .. } | Self::YearInText { field, .. } => Some(*field),
            _ => None,
        }
    }
}

impl fmt::Display for RewriteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardCodedYear { field, bound, year } => write!(
                f,
                "{bound} = {year} appears in {field}; time window left unchanged, review by hand"
            ),
            Self::LowerBoundMovedLater { old, new } => {
                write!(f, "minTime moved later ({old} -> {new}); data coverage may have shrunk")
            }
            Self::UpperBoundMovedEarlier { old, new } => {
                write!(f, "maxTime moved earlier ({old} -> {new}); data coverage may have shrunk")
            }
            Self::MissingReplacementData { variables } => {
                write!(f, "no data points for replacement variables {variables:?}; years not re-anchored")
            }
            Self::YearInText { field, years } => {
                write!(f, "{field} mentions year(s) {}; check it still matches the data", years.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_display_names_field() {
        let warning = RewriteWarning::HardCodedYear {
            field: TextField::Title,
            bound: WindowBound::MinTime,
            year: 2015,
        };
        let text = warning.to_string();
        assert!(text.contains("minTime = 2015"));
        assert!(text.contains("title"));
        assert_eq!(warning.text_field(), Some(TextField::Title));
    }

    #[test]
    fn drift_warning_has_no_field() {
        let warning = RewriteWarning::LowerBoundMovedLater { old: 1990, new: 1995 };
        assert_eq!(warning.text_field(), None);
    }
}

//! Free-text scanning
//!
//! Read-only: titles, subtitles, notes, and slugs are never rewritten, only
//! reported when they mention something that looks like a year.

use chartrev_model::ChartConfig;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::warning::{RewriteWarning, TextField};

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));

/// Value of a free-text field
pub(crate) fn field_text(config: &ChartConfig, field: TextField) -> Option<&str> {
    match field {
        TextField::Title => config.title.as_deref(),
        TextField::Subtitle => config.subtitle.as_deref(),
        TextField::Note => config.note.as_deref(),
        TextField::Slug => config.slug.as_deref(),
    }
}

/// Whether `text` contains `year` as a whole run of digits
pub(crate) fn mentions_number(text: &str, year: i32) -> bool {
    let needle = year.to_string();
    DIGIT_RUN.find_iter(text).any(|m| m.as_str() == needle)
}

/// Four-digit runs in `text`, in order, without repeats
pub(crate) fn year_tokens(text: &str) -> Vec<String> {
    let mut years: Vec<String> = Vec::new();
    for m in DIGIT_RUN.find_iter(text) {
        let token = m.as_str();
        if token.len() == 4 && !years.iter().any(|y| y == token) {
            years.push(token.to_string());
        }
    }
    years
}

/// Warn once per field that mentions a year. Fields in `already_reported`
/// carry a warning from the time-window guard and are skipped.
pub(crate) fn scan_text_fields(
    config: &ChartConfig,
    already_reported: Option<TextField>,
    warnings: &mut Vec<RewriteWarning>,
) {
    for field in TextField::ALL {
        if already_reported == Some(field) {
            continue;
        }
        let Some(text) = field_text(config, field) else {
            continue;
        };
        let years = year_tokens(text);
        if !years.is_empty() {
            warnings.push(RewriteWarning::YearInText { field, years });
        }
    }
}

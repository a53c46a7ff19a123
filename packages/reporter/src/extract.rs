//! Normalization of table cell text into model values.

use std::sync::LazyLock;

use chrono::NaiveDate;
use judge_center_reporter_models::UNKNOWN_NUMBER;
use regex::Regex;

use crate::ReportError;

/// Characters the Judge Center pads cells with that are not trimmed as
/// whitespace by every consumer.
const NOISE: [char; 4] = ['%', '\u{00A0}', '\u{2007}', '\u{202F}'];

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").unwrap_or_else(|_| unreachable!()));

static TOTAL_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\.$").unwrap_or_else(|_| unreachable!()));

/// Removes percent signs and non-breaking spaces anywhere in `text`, then
/// trims surrounding whitespace. Absent text yields an empty string.
#[must_use]
pub fn strip_cell_content<'a>(text: impl Into<Option<&'a str>>) -> String {
    text.into().map_or_else(String::new, |text| {
        text.chars()
            .filter(|c| !NOISE.contains(c))
            .collect::<String>()
            .trim()
            .to_owned()
    })
}

/// Reads the first run of digits in `text`.
///
/// Returns [`UNKNOWN_NUMBER`] when there are no digits or they overflow.
#[must_use]
pub fn cell_as_number(text: &str) -> i64 {
    let stripped = strip_cell_content(text);
    DIGITS
        .find(&stripped)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(UNKNOWN_NUMBER)
}

/// Parses a date out of `text`.
///
/// When `pattern` matches, its first group is parsed, and a group that took
/// no part in the match counts as empty. Otherwise the whole text is. Empty
/// text is `Ok(None)`.
///
/// # Errors
///
/// Returns [`ReportError::Date`] if the non-empty text does not parse with
/// `format`.
pub fn cell_as_date(
    text: &str,
    pattern: &Regex,
    format: &str,
) -> Result<Option<NaiveDate>, ReportError> {
    let candidate = pattern.captures(text).map_or(text, |caps| {
        caps.get(1).map_or("", |m| m.as_str())
    });
    let candidate = strip_cell_content(candidate);
    if candidate.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(&candidate, format)
        .map(Some)
        .map_err(|source| ReportError::Date {
            text: candidate,
            format: format.to_owned(),
            source,
        })
}

/// Returns the first group of `pattern`'s first match in `text`, e.g. the
/// `Judge` of `Role: Judge`.
///
/// # Errors
///
/// Returns [`ReportError::KeyValue`] if `pattern` does not match or its
/// first group did not take part in the match.
pub fn decode_key_value(text: &str, pattern: &Regex) -> Result<String, ReportError> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
        .ok_or_else(|| ReportError::KeyValue {
            text: text.to_owned(),
        })
}

/// Reads the trailing `<digits>.` of a results summary such as
/// `Showing 1 - 100 of 237.`
#[must_use]
pub fn parse_total_count(text: &str) -> Option<u64> {
    let text = text.trim();
    let Some(caps) = TOTAL_COUNT.captures(text) else {
        log::warn!("No investigation count in '{text}'");
        return None;
    };
    match caps[1].parse() {
        Ok(total) => Some(total),
        Err(e) => {
            log::warn!("Unreadable investigation count in '{text}': {e}");
            None
        }
    }
}

//! Permissive scalar parsing for gazetteer CSV fields.
//!
//! Every parser maps blank or malformed input to `None` so a bad cell only
//! nulls its own field and never fails the row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Trim a text cell, mapping blank values to `None`.
///
/// # Examples
/// ```
/// use townlands_data::ingest::clean_text;
///
/// assert_eq!(clean_text(Some("  Baile Átha Cliath ")), Some("Baile Átha Cliath".to_owned()));
/// assert_eq!(clean_text(Some("   ")), None);
/// assert_eq!(clean_text(None), None);
/// ```
#[must_use]
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Parse an integer cell.
///
/// Values written in floating-point form (containing `.`, `e` or `E`) are
/// truncated toward zero. Non-finite and out-of-range values yield `None`.
///
/// # Examples
/// ```
/// use townlands_data::ingest::parse_int;
///
/// assert_eq!(parse_int(Some(" 42 ")), Some(42));
/// assert_eq!(parse_int(Some("-7.9")), Some(-7));
/// assert_eq!(parse_int(Some("1.5e3")), Some(1500));
/// assert_eq!(parse_int(Some("nan")), None);
/// ```
#[must_use]
pub fn parse_int(raw: Option<&str>) -> Option<i64> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    if !text.contains(['.', 'e', 'E']) {
        return text.parse().ok();
    }
    let truncated = text.parse::<f64>().ok().filter(|v| v.is_finite())?.trunc();
    // i64::MIN is exactly representable; i64::MAX rounds up to 2^63.
    let bound = 9_223_372_036_854_775_808.0_f64;
    (truncated >= -bound && truncated < bound).then_some(truncated as i64)
}

/// Parse a floating-point cell; non-finite values yield `None`.
#[must_use]
pub fn parse_float(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parse an ISO-8601 timestamp cell into UTC.
///
/// A trailing `Z` is read as `+00:00`. Timestamps without an offset, and bare
/// dates, are taken to be UTC.
///
/// # Examples
/// ```
/// use townlands_data::ingest::parse_timestamp;
///
/// let stamp = parse_timestamp(Some("2015-03-04T10:20:30Z")).expect("timestamp");
/// assert_eq!(stamp.to_rfc3339(), "2015-03-04T10:20:30+00:00");
/// assert!(parse_timestamp(Some("yesterday")).is_none());
/// ```
#[must_use]
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    let normalised = match text.strip_suffix('Z') {
        Some(stem) => format!("{stem}+00:00"),
        None => text.to_owned(),
    };

    if let Ok(stamp) = DateTime::parse_from_rfc3339(&normalised) {
        return Some(stamp.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"] {
        if let Ok(stamp) = DateTime::parse_from_str(&normalised, format) {
            return Some(stamp.with_timezone(&Utc));
        }
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalised, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(&normalised, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

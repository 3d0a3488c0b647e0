use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// Stored timestamp layout. Fixed width, so string order is time order and
/// the first seven characters are the month bucket.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Years that format as exactly four digits.
pub(crate) const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

#[allow(clippy::expect_used)]
static MONTH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])$").expect("valid month pattern"));

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// The UTC month bucket of a timestamp.
pub(crate) fn month_key(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m").to_string()
}

pub(crate) fn current_month() -> String {
    month_key(&Utc::now())
}

pub(crate) fn validate_month(month: &str) -> Result<()> {
    if MONTH_PATTERN.is_match(month) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "invalid month '{month}', expected YYYY-MM"
        )))
    }
}

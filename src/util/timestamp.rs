use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum_macros::Display;

use super::time_interval::secs_delta;

/// Matches engine style timestamps like `23 Jul 2025 04:05:06.123456789`.
/// The day group accepts three digits because some engine builds emit a corrupted leading digit.
static STK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,3})\s+([A-Za-z]{3,9})\s+(\d{4})\s+(\d{1,2}):(\d{2}):(\d{2})(?:\.(\d+))?\s*$")
        .unwrap()
});

const MONTH_PREFIXES: [&str; 12] =
    ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];

/// A timestamp as delivered by an external provider: either text in one of the supported formats
/// or seconds relative to some epoch known to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Seconds(f64),
    Text(String),
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// No known format matched the textual timestamp.
    UnknownFormat(String),
    /// A relative timestamp was given but no epoch is known.
    MissingEpoch,
    /// The value is not a finite number.
    NonFinite,
    /// The offset moves the timestamp outside the representable range.
    OutOfRange,
}

impl std::error::Error for TimestampError {}

/// One entry in the ordered list of textual timestamp formats.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `DD Mon YYYY HH:MM:SS[.fraction]` with abbreviated or full month names.
    Stk,
    /// RFC 3339 / ISO 8601 with an offset or `Z`.
    Rfc3339,
    /// A naive `chrono` pattern, interpreted as UTC.
    Pattern(&'static str),
}

impl TimestampFormat {
    /// The formats in the order they are tried.
    pub const DEFAULT_ORDER: [TimestampFormat; 6] = [
        TimestampFormat::Stk,
        TimestampFormat::Rfc3339,
        TimestampFormat::Pattern("%Y-%m-%d %H:%M:%S%.f"),
        TimestampFormat::Pattern("%Y-%m-%dT%H:%M:%S%.f"),
        TimestampFormat::Pattern("%Y/%m/%d %H:%M:%S"),
        TimestampFormat::Pattern("%d/%m/%Y %H:%M:%S"),
    ];

    /// Attempts to parse `text` with this format only.
    pub fn try_parse(self, text: &str) -> Option<DateTime<Utc>> {
        let trimmed = text.trim();
        match self {
            TimestampFormat::Stk => parse_stk(trimmed),
            TimestampFormat::Rfc3339 => {
                DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.with_timezone(&Utc))
            }
            TimestampFormat::Pattern(pattern) => {
                NaiveDateTime::parse_from_str(trimmed, pattern).ok().map(|n| n.and_utc())
            }
        }
    }
}

/// Tries the formats of [`TimestampFormat::DEFAULT_ORDER`] in sequence.
///
/// # Returns
/// The first successful parse, or [`TimestampError::UnknownFormat`].
pub fn parse_text(text: &str) -> Result<DateTime<Utc>, TimestampError> {
    TimestampFormat::DEFAULT_ORDER
        .iter()
        .find_map(|fmt| fmt.try_parse(text))
        .ok_or_else(|| TimestampError::UnknownFormat(text.to_string()))
}

impl RawTimestamp {
    /// Resolves the timestamp to an absolute UTC time.
    ///
    /// # Arguments
    /// - `epoch`: The reference for relative (numeric) timestamps.
    pub fn resolve(&self, epoch: Option<DateTime<Utc>>) -> Result<DateTime<Utc>, TimestampError> {
        match self {
            RawTimestamp::Text(text) => parse_text(text),
            RawTimestamp::Seconds(secs) => {
                if !secs.is_finite() {
                    return Err(TimestampError::NonFinite);
                }
                let epoch = epoch.ok_or(TimestampError::MissingEpoch)?;
                epoch.checked_add_signed(secs_delta(*secs)).ok_or(TimestampError::OutOfRange)
            }
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_y, next_m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_y, next_m, 1)
        .and_then(|d| d.pred_opt())
        .map_or(28, |d| d.day())
}

fn parse_stk(text: &str) -> Option<DateTime<Utc>> {
    let caps = STK_REGEX.captures(text)?;
    let month_name = caps[2].to_ascii_lowercase();
    let month = MONTH_PREFIXES.iter().position(|m| month_name.starts_with(m))? + 1;
    let month = u32::try_from(month).ok()?;
    let year: i32 = caps[3].parse().ok()?;

    let day_text = &caps[1];
    let day: u32 = if day_text.len() == 3 {
        // keep the trailing two digits and clamp to the month length
        let repaired: u32 = day_text[1..].parse().ok()?;
        repaired.clamp(1, days_in_month(year, month))
    } else {
        day_text.parse().ok()?
    };

    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;
    let second: u32 = caps[6].parse().ok()?;
    let nanos = caps.get(7).map_or(Some(0), |frac| {
        let digits: String = frac.as_str().chars().take(9).collect();
        format!("{digits:0<9}").parse::<u32>().ok()
    })?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_nano_opt(hour, minute, second, nanos)?;
    Some(naive.and_utc())
}

/// Seconds between `epoch` and `t`, negative if `t` lies before the epoch.
pub fn offset_secs(epoch: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    super::time_interval::delta_secs(t - epoch)
}

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StatsError};

/// Offset-bearing layouts tried after RFC 3339 (space separator, no seconds).
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Layouts without an offset; these are read as local wall-clock time.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse an ISO 8601 timestamp, keeping the offset it declares.
///
/// A trailing `Z` is rewritten to `+00:00`. Timestamps without an offset
/// are placed in the host's local timezone, and a bare `YYYY-MM-DD` means
/// local midnight.
pub fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(StatsError::TimestampParse(s.to_string()));
    }

    let normalised = match trimmed.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Ok(dt);
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalised, fmt) {
            return Ok(dt);
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            if let Some(dt) = localize(&naive) {
                return Ok(dt);
            }
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0).as_ref().and_then(localize) {
            return Ok(dt);
        }
    }

    Err(StatsError::TimestampParse(s.to_string()))
}

/// Parse a timestamp held in a JSON value. Only strings can parse.
pub fn parse_timestamp_value(value: &Value) -> Option<DateTime<FixedOffset>> {
    let s = value.as_str()?;
    match parse_timestamp(s) {
        Ok(dt) => Some(dt),
        Err(e) => {
            debug!("{}", e);
            None
        }
    }
}

/// Current wall-clock time with the host's UTC offset attached.
pub fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Attach the local offset to a naive date-time. Times skipped by a DST
/// transition have no local representation and yield `None`.
fn localize(naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    Local
        .from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

// src/datetime.rs
//! Datetime normalization between the canonical UTC representation and the
//! string formats ServiceNow and Jira expect.
//!
//! | Format | Pattern | Example |
//! |---|---|---|
//! | Canonical (inbound) | `YYYY-MM-DDTHH:MM:SSZ` | `2022-01-16T16:39:43Z` |
//! | ServiceNow | `YYYY-MM-DD HH:MM:SS` | `2022-01-16 16:39:43` |
//! | Jira (full) | `YYYY-MM-DDTHH:MM:SSZ` | `2022-02-06T09:50:37Z` |
//! | Jira (display) | `YYYY-MM-DD HH:MM` | `2022-02-06 09:50` |
//!
//! Everything here is pure; no clock reads except [`CanonicalTimestamp::now`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeDelta as ChronoDelta, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AutomationError, Result};

pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
pub const SERVICENOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const JIRA_FULL_FORMAT: &str = CANONICAL_FORMAT;
pub const JIRA_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

// Fixed-width shape check; chrono alone accepts unpadded fields.
static CANONICAL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}Z$")
        .expect("canonical timestamp regex")
});

/// A UTC instant with whole-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalTimestamp(DateTime<Utc>);

impl CanonicalTimestamp {
    /// Current wall-clock time, truncated to the second.
    pub fn now() -> Self {
        Self::truncate(Utc::now())
    }

    fn truncate(dt: DateTime<Utc>) -> Self {
        // with_nanosecond(0) can only fail for out-of-range input, which 0 is not
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for CanonicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for CanonicalTimestamp {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self> {
        parse_canonical(s)
    }
}

/// Signed, calendar-free duration. Fields are summed; no month/year units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeDelta {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeDelta {
    pub fn days(days: i64) -> Self {
        Self {
            days,
            ..Self::default()
        }
    }

    pub fn hours(hours: i64) -> Self {
        Self {
            hours,
            ..Self::default()
        }
    }

    pub fn minutes(minutes: i64) -> Self {
        Self {
            minutes,
            ..Self::default()
        }
    }

    pub fn seconds(seconds: i64) -> Self {
        Self {
            seconds,
            ..Self::default()
        }
    }

    /// `None` when any component (or their sum) overflows chrono's range.
    pub fn to_duration(self) -> Option<ChronoDelta> {
        ChronoDelta::try_days(self.days)?
            .checked_add(&ChronoDelta::try_hours(self.hours)?)?
            .checked_add(&ChronoDelta::try_minutes(self.minutes)?)?
            .checked_add(&ChronoDelta::try_seconds(self.seconds)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Add,
    Subtract,
}

impl FromStr for Direction {
    type Err = AutomationError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Direction::Add),
            "subtract" => Ok(Direction::Subtract),
            _ => Err(AutomationError::InvalidModifier(s.to_string())),
        }
    }
}

/// Parse the strict canonical form `YYYY-MM-DDTHH:MM:SSZ`.
pub fn parse_canonical(s: &str) -> Result<CanonicalTimestamp> {
    if !CANONICAL_SHAPE.is_match(s) {
        return Err(AutomationError::malformed(
            s,
            "expected YYYY-MM-DDTHH:MM:SSZ",
        ));
    }
    let naive = NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT)
        .map_err(|e| AutomationError::malformed(s, e.to_string()))?;
    if naive.nanosecond() != 0 {
        return Err(AutomationError::malformed(s, "leap seconds are not supported"));
    }
    Ok(CanonicalTimestamp(naive.and_utc()))
}

/// ServiceNow: `YYYY-MM-DD HH:MM:SS`.
pub fn to_ticketing_format(t: CanonicalTimestamp) -> String {
    t.0.format(SERVICENOW_FORMAT).to_string()
}

/// Jira: full `YYYY-MM-DDTHH:MM:SSZ` for machine fields (planned dates),
/// minute-precision `YYYY-MM-DD HH:MM` for display fields.
pub fn to_issue_tracker_format(t: CanonicalTimestamp, include_seconds: bool) -> String {
    let fmt = if include_seconds {
        JIRA_FULL_FORMAT
    } else {
        JIRA_DISPLAY_FORMAT
    };
    t.0.format(fmt).to_string()
}

pub fn shift(
    t: CanonicalTimestamp,
    delta: TimeDelta,
    direction: Direction,
) -> Result<CanonicalTimestamp> {
    let d = delta
        .to_duration()
        .ok_or_else(|| AutomationError::malformed(&t.to_string(), "time delta out of range"))?;
    let shifted = match direction {
        Direction::Add => t.0.checked_add_signed(d),
        Direction::Subtract => t.0.checked_sub_signed(d),
    };
    shifted
        .map(CanonicalTimestamp)
        .ok_or_else(|| AutomationError::malformed(&t.to_string(), "shifted time out of range"))
}

/// Add `add_hours`, then subtract `subtract_hours`. Absent values are skipped.
pub fn apply_offset_hours(
    t: CanonicalTimestamp,
    add_hours: Option<i64>,
    subtract_hours: Option<i64>,
) -> Result<CanonicalTimestamp> {
    let mut out = t;
    if let Some(h) = add_hours {
        out = shift(out, TimeDelta::hours(h), Direction::Add)?;
    }
    if let Some(h) = subtract_hours {
        out = shift(out, TimeDelta::hours(h), Direction::Subtract)?;
    }
    Ok(out)
}

/// Offset a timestamp and render it for Jira in one step.
pub fn issue_tracker_planned(
    t: CanonicalTimestamp,
    add_hours: Option<i64>,
    subtract_hours: Option<i64>,
    include_seconds: bool,
) -> Result<String> {
    let shifted = apply_offset_hours(t, add_hours, subtract_hours)?;
    Ok(to_issue_tracker_format(shifted, include_seconds))
}

/// Canonical string in, shifted ServiceNow string out.
pub fn modify_time(s: &str, modifier: &str, delta: TimeDelta) -> Result<String> {
    let t = parse_canonical(s)?;
    let direction: Direction = modifier.parse()?;
    Ok(to_ticketing_format(shift(t, delta, direction)?))
}

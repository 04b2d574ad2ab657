use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Month, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MonitorError, Result};

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Parses CSV timestamps, interpreting naive values in a configured zone.
#[derive(Debug, Clone)]
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler with the given IANA timezone name as the default.
    ///
    /// Unknown names are a configuration error rather than a silent UTC
    /// fallback, since they would shift records between monthly chunks.
    pub fn new(tz_name: &str) -> Result<Self> {
        let tz = tz_name
            .parse::<Tz>()
            .map_err(|_| MonitorError::Config(format!("unknown timezone \"{}\"", tz_name)))?;
        Ok(Self { default_tz: tz })
    }

    pub fn utc() -> Self {
        Self { default_tz: Tz::UTC }
    }

    /// Parse a timestamp string into a UTC [`DateTime`].
    ///
    /// Accepts RFC 3339 (with `Z` or an offset), naive date-times with a
    /// `T` or space separator and optional fractional seconds, and bare
    /// dates (midnight). Returns `None` for anything else.
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }

        const FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
        ];
        for fmt in FMTS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return self.localize(naive);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).and_then(|n| self.localize(n));
        }

        warn!("could not parse timestamp \"{}\"", s);
        None
    }

    fn localize(&self, naive: chrono::NaiveDateTime) -> Option<DateTime<Utc>> {
        // Ambiguous local times (DST fold) resolve to the earlier instant.
        self.default_tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }
}

// ── Chunk keys ────────────────────────────────────────────────────────────────

/// Monthly chunk key for a timestamp, `"YYYY-MM"`, taken from the calendar
/// of `tz`.
pub fn month_key(ts: DateTime<Utc>, tz: Tz) -> String {
    ts.with_timezone(&tz).format("%Y-%m").to_string()
}

fn chunk_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\d{4})-(\d{1,2})(?:[-T ].*)?$").expect("regex is valid")
    })
}

// ── MonthLabel ────────────────────────────────────────────────────────────────

/// A calendar month normalized for reporting, e.g. `april_2024`.
///
/// Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthLabel {
    year: i32,
    month: u32,
}

impl MonthLabel {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(MonitorError::InvalidMonthLabel(format!(
                "month {} out of range",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// Normalize a chunk key such as `"2024-04"` or `"2024-04-01 00:00:00"`.
    pub fn from_chunk_key(key: &str) -> Result<Self> {
        let caps = chunk_key_regex()
            .captures(key)
            .ok_or_else(|| MonitorError::InvalidChunkKey(key.to_string()))?;
        let year: i32 = caps[1]
            .parse()
            .map_err(|_| MonitorError::InvalidChunkKey(key.to_string()))?;
        let month: u32 = caps[2]
            .parse()
            .map_err(|_| MonitorError::InvalidChunkKey(key.to_string()))?;
        Self::new(year, month).map_err(|_| MonitorError::InvalidChunkKey(key.to_string()))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    fn month_name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("unknown")
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.month_name().to_lowercase(), self.year)
    }
}

impl FromStr for MonthLabel {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MonitorError::InvalidMonthLabel(s.to_string());
        let (name, year) = s.rsplit_once('_').ok_or_else(invalid)?;
        let month = name.parse::<Month>().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        Self::new(year, month.number_from_month())
    }
}

impl Serialize for MonthLabel {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthLabel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

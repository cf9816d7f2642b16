//! Normalization of extracted timestamps to UTC

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use std::fmt;

/// A timestamp as read from a metadata source, before normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp {
    /// Carries an explicit offset
    Zoned(DateTime<FixedOffset>),
    /// Wall-clock time with no zone information
    Naive(NaiveDateTime),
    /// Already an absolute instant (file system times)
    Instant(DateTime<Utc>),
}

/// Zone assumed for timestamps that carry no offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZonePolicy {
    /// The host's zone, using its UTC offset at the time the run starts
    Local,
    /// A fixed offset given in configuration
    Fixed(FixedOffset),
}

impl ZonePolicy {
    /// Parse "local", "utc" or an offset such as "+09:00", "-0530", "+02"
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" | "host" | "" => return Ok(ZonePolicy::Local),
            "utc" | "z" | "gmt" => return Ok(ZonePolicy::Fixed(utc_offset())),
            _ => {}
        }

        parse_offset(trimmed)
            .map(ZonePolicy::Fixed)
            .ok_or_else(|| Error::InvalidTimezone(value.to_string()))
    }

    /// Offset applied to naive timestamps for this run
    pub fn assumed_offset(&self) -> FixedOffset {
        match self {
            ZonePolicy::Local => *Local::now().offset(),
            ZonePolicy::Fixed(offset) => *offset,
        }
    }
}

impl fmt::Display for ZonePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZonePolicy::Local => write!(f, "local"),
            ZonePolicy::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// Convert a raw timestamp to UTC, reading naive values in `assumed` zone
///
/// `None` when shifting a naive value leaves chrono's representable range.
pub fn to_utc(raw: RawTimestamp, assumed: FixedOffset) -> Option<DateTime<Utc>> {
    match raw {
        RawTimestamp::Zoned(dt) => Some(dt.with_timezone(&Utc)),
        RawTimestamp::Instant(dt) => Some(dt),
        RawTimestamp::Naive(naive) => naive
            .checked_sub_signed(TimeDelta::seconds(i64::from(assumed.local_minus_utc())))
            .map(|shifted| Utc.from_utc_datetime(&shifted)),
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parse `±hh`, `±hhmm` or `±hh:mm`
pub(crate) fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

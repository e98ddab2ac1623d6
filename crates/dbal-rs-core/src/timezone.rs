//! Timezone handling for result normalization.
//!
//! A [`Zone`] is either a fixed UTC offset or a named IANA zone. Database
//! sessions commonly report offsets (`+00:00`) while applications are usually
//! configured with names (`Europe/Prague`), so both forms are accepted
//! wherever a zone is configured.
//!
//! ## Quick Start
//!
//! ```
//! use dbal_rs_core::timezone::Zone;
//! use chrono::{NaiveDate, Timelike};
//!
//! let connection: Zone = "+02:00".parse().unwrap();
//! let application: Zone = "UTC".parse().unwrap();
//!
//! let wall = NaiveDate::from_ymd_opt(2024, 6, 15)
//!     .unwrap()
//!     .and_hms_opt(12, 0, 0)
//!     .unwrap();
//! let instant = connection.localize(wall).unwrap();
//! let display = application.convert(&instant);
//! assert_eq!(display.hour(), 10);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::DbalError;

/// A timezone: either a fixed offset east of UTC or a named IANA zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// A fixed offset, e.g. `+02:00`.
    Fixed(FixedOffset),
    /// A named zone with daylight-saving rules, e.g. `Europe/Prague`.
    Named(Tz),
}

impl Zone {
    /// Returns the UTC zone.
    pub fn utc() -> Self {
        Self::Fixed(utc_offset())
    }

    /// Qualifies a wall-clock value with this zone.
    ///
    /// Ambiguous local times (the repeated hour when clocks go back) resolve to
    /// the earliest instant. Local times skipped by a daylight-saving
    /// transition do not exist and yield `None`.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Fixed(offset) => offset.from_local_datetime(&naive).single(),
            Self::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        }
    }

    /// Re-expresses an instant in this zone. The instant itself is unchanged.
    pub fn convert(&self, dt: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        match self {
            Self::Fixed(offset) => dt.with_timezone(offset),
            Self::Named(tz) => dt.with_timezone(tz).fixed_offset(),
        }
    }
}

impl Default for Zone {
    fn default() -> Self {
        Self::utc()
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(offset) => write!(f, "{offset}"),
            Self::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

impl FromStr for Zone {
    type Err = DbalError;

    /// Parses `Z`, `UTC`, `+HH`, `+HH:MM`, `+HHMM` (and their negative forms)
    /// as fixed offsets; anything else is looked up as an IANA zone name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
            return Ok(Self::utc());
        }
        if trimmed.starts_with('+') || trimmed.starts_with('-') {
            return parse_offset(trimmed)
                .map(Self::Fixed)
                .ok_or_else(|| DbalError::InvalidTimeZone(trimmed.to_string()));
        }
        trimmed
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|e| DbalError::InvalidTimeZone(format!("{trimmed}: {e}")))
    }
}

/// Parses a signed UTC offset such as `+01`, `-05:30`, `+0530`, or
/// `+05:53:28`.
///
/// Returns `None` when the text is not an offset or is out of range.
pub fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || digits.len() % 2 != 0 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut parts = digits
        .as_bytes()
        .chunks(2)
        .map(|pair| i32::from(pair[0] - b'0') * 10 + i32::from(pair[1] - b'0'));
    let hours = parts.next()?;
    let minutes = parts.next().unwrap_or(0);
    let seconds = parts.next().unwrap_or(0);
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds))
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// The pair of zones a normalizer factory captures at construction.
///
/// `connection` is the session timezone the database server uses when it
/// renders zone-less values; `application` is the zone results are
/// expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeZones {
    /// The database session timezone.
    pub connection: Zone,
    /// The application display timezone.
    pub application: Zone,
}

impl TimeZones {
    /// Creates a pair of zones.
    pub const fn new(connection: Zone, application: Zone) -> Self {
        Self {
            connection,
            application,
        }
    }

    /// Uses the same zone for the connection and the application.
    pub const fn uniform(zone: Zone) -> Self {
        Self::new(zone, zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Timelike};

    fn wall(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_utc() {
        assert_eq!("UTC".parse::<Zone>().unwrap(), Zone::utc());
        assert_eq!("Z".parse::<Zone>().unwrap(), Zone::utc());
    }

    #[test]
    fn test_parse_fixed_offsets() {
        let zone: Zone = "+02:00".parse().unwrap();
        assert_eq!(zone, Zone::Fixed(FixedOffset::east_opt(7200).unwrap()));

        let zone: Zone = "-0530".parse().unwrap();
        assert_eq!(
            zone,
            Zone::Fixed(FixedOffset::east_opt(-(5 * 3600 + 30 * 60)).unwrap())
        );

        let zone: Zone = "+01".parse().unwrap();
        assert_eq!(zone, Zone::Fixed(FixedOffset::east_opt(3600).unwrap()));
    }

    #[test]
    fn test_parse_offset_with_seconds() {
        let offset = parse_offset("+05:53:28").unwrap();
        assert_eq!(offset.local_minus_utc(), 5 * 3600 + 53 * 60 + 28);
    }

    #[test]
    fn test_parse_offset_rejects_garbage() {
        assert!(parse_offset("+1").is_none());
        assert!(parse_offset("+ab").is_none());
        assert!(parse_offset("02:00").is_none());
        assert!(parse_offset("+02:75").is_none());
    }

    #[test]
    fn test_parse_named_zone() {
        let zone: Zone = "Europe/Prague".parse().unwrap();
        assert_eq!(zone, Zone::Named(Tz::Europe__Prague));
        assert_eq!(zone.to_string(), "Europe/Prague");
    }

    #[test]
    fn test_parse_unknown_zone() {
        let err = "Mars/Olympus".parse::<Zone>().unwrap_err();
        assert!(matches!(err, DbalError::InvalidTimeZone(_)));
    }

    #[test]
    fn test_localize_named_zone_respects_dst() {
        let zone: Zone = "Europe/Prague".parse().unwrap();
        let winter = zone.localize(wall(2024, 1, 15, 12, 0)).unwrap();
        assert_eq!(winter.offset().local_minus_utc(), 3600);
        let summer = zone.localize(wall(2024, 7, 15, 12, 0)).unwrap();
        assert_eq!(summer.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_localize_skipped_hour_is_none() {
        let zone: Zone = "Europe/Prague".parse().unwrap();
        assert!(zone.localize(wall(2024, 3, 31, 2, 30)).is_none());
    }

    #[test]
    fn test_convert_crosses_midnight() {
        let utc = Zone::utc();
        let instant = utc.localize(wall(2024, 1, 1, 3, 0)).unwrap();
        let est: Zone = "-05:00".parse().unwrap();
        let local = est.convert(&instant);
        assert_eq!(local.hour(), 22);
        assert_eq!(local.day(), 31);
        assert_eq!(local.month(), 12);
        assert_eq!(local, instant);
    }

    #[test]
    fn test_time_zones_uniform() {
        let zones = TimeZones::uniform(Zone::utc());
        assert_eq!(zones.connection, zones.application);
        assert_eq!(TimeZones::default(), zones);
    }
}

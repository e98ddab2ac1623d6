//! Result normalization shared by every backend.
//!
//! A driver reports one native type tag per result column. A
//! [`ResultNormalizerFactory`] turns those tags into a [`NormalizerMap`]: for
//! each column that needs converting, the [`Normalizer`] that turns its raw
//! text into a canonical [`Value`]. Columns without an entry pass through
//! unchanged as [`Value::String`].
//!
//! The map is plain data. It holds a copy of the factory's [`TimeZones`], so
//! it can be cloned, compared, and shared between threads freely; resolving
//! the same column types twice yields equal maps.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{
    DateTime, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use regex::Regex;

use dbal_rs_core::timezone::parse_offset;
use dbal_rs_core::{DbalResult, TimeZones, Zone};

use crate::value::Value;
use crate::{mysql, pgsql};

/// Which zone qualifies a datetime whose raw text carries no offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneQualifier {
    /// The database session timezone.
    Connection,
    /// The application timezone.
    Application,
}

/// One conversion from raw column text to a canonical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalizer {
    /// Integer cast.
    Int,
    /// Floating-point cast.
    Float,
    /// PostgreSQL boolean text (`t`, `yes`, `on`, ...).
    Bool,
    /// MySQL `TIME` (`[-]HH:MM:SS`) as a signed interval.
    Time,
    /// Timezone-aware datetime, re-expressed in the application zone.
    ZonedDateTime(ZoneQualifier),
    /// Wall-clock datetime without a zone.
    LocalDateTime,
    /// PostgreSQL `interval` text.
    Interval,
    /// PostgreSQL `bit`/`varbit` text decoded as a base-2 integer.
    BitString,
    /// PostgreSQL `bytea` text, unescaped to raw bytes.
    Bytea,
}

impl Normalizer {
    /// Converts one raw value.
    ///
    /// `None` (SQL NULL) always yields [`Value::Null`]. The only conversion
    /// that can fail is [`Normalizer::Time`]; every other malformed input
    /// degrades to a default value, `Null`, or the raw text.
    pub fn normalize(self, raw: Option<&str>, zones: &TimeZones) -> DbalResult<Value> {
        let Some(raw) = raw else {
            return Ok(Value::Null);
        };

        Ok(match self {
            Self::Int => Value::Int(cast_int(raw)),
            Self::Float => Value::Float(cast_float(raw)),
            Self::Bool => Value::Bool(pgsql::parse_bool(raw)),
            Self::Time => Value::Interval(mysql::parse_time(raw)?),
            Self::ZonedDateTime(qualifier) => {
                let zone = match qualifier {
                    ZoneQualifier::Connection => zones.connection,
                    ZoneQualifier::Application => zones.application,
                };
                zoned_datetime(raw, zone, zones.application)
            }
            Self::LocalDateTime => local_datetime(raw),
            Self::Interval => pgsql::parse_interval(raw).map_or(Value::Null, Value::Interval),
            Self::BitString => pgsql::parse_bit_string(raw).map_or(Value::Null, Value::Int),
            Self::Bytea => Value::Bytes(pgsql::unescape_bytea(raw)),
        })
    }
}

/// Column name to normalizer mapping for one result shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizerMap {
    normalizers: HashMap<String, Normalizer>,
    zones: TimeZones,
}

impl NormalizerMap {
    /// Creates an empty map that will convert datetimes with `zones`.
    pub fn new(zones: TimeZones) -> Self {
        Self {
            normalizers: HashMap::new(),
            zones,
        }
    }

    /// Registers the normalizer for a column.
    pub fn insert(&mut self, column: impl Into<String>, normalizer: Normalizer) {
        self.normalizers.insert(column.into(), normalizer);
    }

    /// Returns the normalizer registered for a column, if any.
    pub fn get(&self, column: &str) -> Option<Normalizer> {
        self.normalizers.get(column).copied()
    }

    /// Returns `true` if the column has a normalizer.
    pub fn contains(&self, column: &str) -> bool {
        self.normalizers.contains_key(column)
    }

    /// Returns the number of columns with a normalizer.
    pub fn len(&self) -> usize {
        self.normalizers.len()
    }

    /// Returns `true` if no column needs normalizing.
    pub fn is_empty(&self) -> bool {
        self.normalizers.is_empty()
    }

    /// Returns the zones datetimes are converted with.
    pub const fn zones(&self) -> &TimeZones {
        &self.zones
    }

    /// Normalizes one raw value of `column`.
    ///
    /// Columns without a normalizer pass through as [`Value::String`];
    /// `None` is always [`Value::Null`].
    pub fn normalize(&self, column: &str, raw: Option<&str>) -> DbalResult<Value> {
        match (self.normalizers.get(column), raw) {
            (_, None) => Ok(Value::Null),
            (Some(normalizer), raw) => normalizer.normalize(raw, &self.zones),
            (None, Some(raw)) => Ok(Value::String(raw.to_string())),
        }
    }
}

/// Builds normalizer maps from driver-reported column types.
///
/// Implementations hold nothing but immutable configuration, so `resolve`
/// is pure and may be called from any number of threads at once.
pub trait ResultNormalizerFactory: Send + Sync {
    /// Returns the zones captured at construction.
    fn time_zones(&self) -> TimeZones;

    /// Returns the normalizer for a native type tag, or `None` when values
    /// of that type pass through unchanged.
    fn normalizer_for(&self, type_tag: &str) -> Option<Normalizer>;

    /// Resolves a column name to type tag mapping into a [`NormalizerMap`].
    ///
    /// Passthrough and unrecognized tags are left out of the map.
    fn resolve(&self, types: &HashMap<String, String>) -> NormalizerMap {
        let mut map = NormalizerMap::new(self.time_zones());
        for (column, type_tag) in types {
            if let Some(normalizer) = self.normalizer_for(type_tag) {
                map.insert(column.clone(), normalizer);
            }
        }
        map
    }
}

// ── Numeric casts ──────────────────────────────────────────────────────

/// Casts text to an integer the way a loose numeric cast does: leading
/// whitespace is skipped and the leading run of digits (with an optional
/// sign) is used. Text without leading digits is 0; out-of-range values
/// saturate.
pub fn cast_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    if let Ok(v) = s.trim_end().parse::<i64>() {
        return v;
    }

    let bytes = s.as_bytes();
    let sign_len = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = bytes[sign_len..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return 0;
    }

    s[..sign_len + digits].parse::<i64>().unwrap_or_else(|_| {
        if s.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        }
    })
}

/// Casts text to a float: the whole string if it parses, otherwise its
/// longest numeric prefix, otherwise 0.0.
pub fn cast_float(raw: &str) -> f64 {
    static NUMERIC_PREFIX: OnceLock<Regex> = OnceLock::new();

    let s = raw.trim();
    if let Ok(v) = s.parse::<f64>() {
        return v;
    }

    let prefix = NUMERIC_PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
    });
    prefix
        .find(s)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

// ── Datetimes ──────────────────────────────────────────────────────────

/// Splits datetime text into a wall clock and an optional explicit offset.
///
/// Accepts `YYYY-MM-DD`, `HH:MM:SS[.f]`, or both separated by a space or
/// `T`, optionally followed by `Z` or a numeric offset. Date-only values are
/// placed at midnight; time-only values are anchored on 1970-01-01.
/// `24:00:00` rolls over to midnight of the following day.
pub fn parse_wall_clock(raw: &str) -> Option<(NaiveDateTime, Option<FixedOffset>)> {
    static DATETIME: OnceLock<Regex> = OnceLock::new();

    let re = DATETIME.get_or_init(|| {
        Regex::new(
            r"^(?P<date>\d{4,}-\d{1,2}-\d{1,2})?[ T]?(?P<time>\d{1,2}:\d{2}:\d{2}(?:\.\d+)?)?\s*(?P<offset>Z|[+-]\d{2}(?::?\d{2}){0,2})?$",
        )
        .expect("valid regex")
    });

    let caps = re.captures(raw.trim())?;
    let date = caps.name("date");
    let time = caps.name("time");
    if date.is_none() && time.is_none() {
        return None;
    }

    let date = match date {
        Some(d) => NaiveDate::parse_from_str(d.as_str(), "%Y-%m-%d").ok()?,
        None => NaiveDate::default(),
    };
    let (time, next_day) = match time {
        Some(t) => clock(t.as_str())?,
        None => (NaiveTime::default(), false),
    };
    let offset = match caps.name("offset").map(|m| m.as_str()) {
        None => None,
        Some("Z") => Some(Utc.fix()),
        Some(text) => Some(parse_offset(text)?),
    };

    let naive = date.and_time(time);
    let naive = if next_day {
        naive.checked_add_days(Days::new(1))?
    } else {
        naive
    };
    Some((naive, offset))
}

/// Parses `HH:MM:SS[.f]`. `24:00:00` is the end of the day and comes back
/// as midnight with the carry flag set.
fn clock(text: &str) -> Option<(NaiveTime, bool)> {
    match text.strip_prefix("24:00:00") {
        Some(rest) if rest.bytes().all(|b| b == b'.' || b == b'0') => {
            Some((NaiveTime::default(), true))
        }
        _ => NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .ok()
            .map(|t| (t, false)),
    }
}

/// Interprets raw datetime text as an instant and expresses it in
/// `application`. Text without an explicit offset is qualified with
/// `qualifier`.
fn zoned_datetime(raw: &str, qualifier: Zone, application: Zone) -> Value {
    let instant: Option<DateTime<FixedOffset>> =
        parse_wall_clock(raw).and_then(|(naive, offset)| match offset {
            Some(offset) => offset.from_local_datetime(&naive).single(),
            None => qualifier.localize(naive),
        });

    match instant {
        Some(instant) => Value::DateTime(application.convert(&instant)),
        None => {
            tracing::warn!(value = raw, zone = %qualifier, "unparseable datetime passed through");
            Value::String(raw.to_string())
        }
    }
}

fn local_datetime(raw: &str) -> Value {
    match parse_wall_clock(raw) {
        Some((naive, _)) => Value::LocalDateTime(naive),
        None => {
            tracing::warn!(value = raw, "unparseable local datetime passed through");
            Value::String(raw.to_string())
        }
    }
}

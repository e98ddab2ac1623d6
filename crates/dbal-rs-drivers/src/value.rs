//! Canonical value types produced by result normalization.
//!
//! The [`Value`] enum is what every backend's raw column text is converted
//! into. It is also the parameter type accepted by
//! [`Driver::query`](crate::driver::Driver::query).

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;

/// A backend-agnostic representation of a column value.
///
/// # Examples
///
/// ```
/// use dbal_rs_drivers::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hello");
/// assert_eq!(v, Value::String("hello".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// SQL NULL.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// Text passed through unchanged.
    String(String),
    /// Raw binary data.
    Bytes(Vec<u8>),
    /// A timezone-aware instant, expressed in the application timezone.
    DateTime(DateTime<FixedOffset>),
    /// A wall-clock date and time that carries no timezone.
    LocalDateTime(NaiveDateTime),
    /// A duration or calendar interval.
    Interval(Interval),
}

/// A duration with calendar components and a sign flag.
///
/// Each component is signed on its own, because PostgreSQL intervals such as
/// `-1 days +02:00:00` mix signs. `inverted` additionally negates the whole
/// interval; MySQL `TIME` values use it to carry their sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Interval {
    /// Whole months (years are folded in as twelve months).
    pub months: i32,
    /// Whole days.
    pub days: i32,
    /// The time part, in microseconds.
    pub microseconds: i64,
    /// Whether the interval as a whole is negative.
    pub inverted: bool,
}

impl Interval {
    /// Creates a non-inverted interval from its components.
    pub const fn new(months: i32, days: i32, microseconds: i64) -> Self {
        Self {
            months,
            days,
            microseconds,
            inverted: false,
        }
    }

    /// Creates a time-only interval of `hours:minutes:seconds`.
    ///
    /// Returns `None` if the total does not fit in `i64` microseconds.
    pub fn from_hms(hours: i64, minutes: i64, seconds: i64, inverted: bool) -> Option<Self> {
        let microseconds = hours
            .checked_mul(MICROS_PER_HOUR)?
            .checked_add(minutes.checked_mul(MICROS_PER_MINUTE)?)?
            .checked_add(seconds.checked_mul(MICROS_PER_SECOND)?)?;
        Some(Self {
            months: 0,
            days: 0,
            microseconds,
            inverted,
        })
    }

    /// Returns `true` if the interval as a whole is negative.
    pub const fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Converts the interval to an exact duration.
    ///
    /// Months have no fixed length, so intervals with a month component
    /// return `None`. Days count as 24 hours.
    pub fn to_duration(&self) -> Option<chrono::Duration> {
        if self.months != 0 {
            return None;
        }
        let micros = i64::from(self.days)
            .checked_mul(24 * MICROS_PER_HOUR)?
            .checked_add(self.microseconds)?;
        let duration = chrono::Duration::microseconds(micros);
        Some(if self.inverted { -duration } else { duration })
    }
}

impl fmt::Display for Interval {
    /// Formats the interval in ISO 8601 duration notation, e.g. `-PT1H2M3S`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            write!(f, "-")?;
        }
        write!(f, "P")?;
        let years = self.months / 12;
        let months = self.months % 12;
        if years != 0 {
            write!(f, "{years}Y")?;
        }
        if months != 0 {
            write!(f, "{months}M")?;
        }
        if self.days != 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.microseconds != 0 || (self.months == 0 && self.days == 0) {
            let hours = self.microseconds / MICROS_PER_HOUR;
            let minutes = (self.microseconds % MICROS_PER_HOUR) / MICROS_PER_MINUTE;
            let micros = self.microseconds % MICROS_PER_MINUTE;
            write!(f, "T")?;
            if hours != 0 {
                write!(f, "{hours}H")?;
            }
            if minutes != 0 {
                write!(f, "{minutes}M")?;
            }
            if micros % MICROS_PER_SECOND == 0 {
                if micros != 0 || (hours == 0 && minutes == 0) {
                    write!(f, "{}S", micros / MICROS_PER_SECOND)?;
                }
            } else {
                #[allow(clippy::cast_precision_loss)]
                let seconds = micros as f64 / MICROS_PER_SECOND as f64;
                write!(f, "{seconds}S")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::LocalDateTime(dt) => write!(f, "{dt}"),
            Self::Interval(i) => write!(f, "{i}"),
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::DateTime(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::LocalDateTime(v)
    }
}

impl From<Interval> for Value {
    fn from(v: Interval) -> Self {
        Self::Interval(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}

impl Value {
    /// Returns `true` if this value is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to extract a boolean value.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a byte slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Attempts to extract a timezone-aware datetime.
    pub const fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Attempts to extract a wall-clock datetime.
    pub const fn as_local_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Self::LocalDateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Attempts to extract an interval.
    pub const fn as_interval(&self) -> Option<&Interval> {
        match self {
            Self::Interval(i) => Some(i),
            _ => None,
        }
    }
}

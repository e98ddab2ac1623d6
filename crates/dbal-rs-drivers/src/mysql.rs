//! MySQL result normalization.
//!
//! The MySQL driver reports native type names such as `LONGLONG` or
//! `DATETIME` for each result column and hands every value over as text.
//! [`MysqlResultNormalizerFactory`] maps those names onto [`Normalizer`]s.
//!
//! `TIMESTAMP` values are rendered by the server in the session timezone,
//! so they are qualified with the connection zone before being converted to
//! the application zone. `DATETIME` and `DATE` carry no zone at all and are
//! returned as wall-clock values.

use std::sync::OnceLock;

use regex::Regex;

use dbal_rs_core::{DbalError, DbalResult, TimeZones};

use crate::normalizer::{Normalizer, ResultNormalizerFactory, ZoneQualifier};
use crate::value::Interval;

/// A MySQL native column type as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MysqlColumnType {
    /// `BIT`
    Bit,
    /// `TINY`
    Tiny,
    /// `SHORT`
    Short,
    /// `INT24`
    Int24,
    /// `LONG`
    Long,
    /// `LONGLONG`
    LongLong,
    /// `YEAR`
    Year,
    /// `INTERVAL`
    Interval,
    /// `FLOAT`
    Float,
    /// `DOUBLE`
    Double,
    /// `DATETIME`
    DateTime,
    /// `DATE`
    Date,
    /// `TIMESTAMP`
    Timestamp,
    /// `TIME`
    Time,
    /// `VAR_STRING` and `STRING`: text that is already canonical.
    Passthrough,
    /// Any other type name. Values pass through unchanged.
    Other(String),
}

impl MysqlColumnType {
    /// Parses a driver type name. Unknown names become [`Self::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "BIT" => Self::Bit,
            "TINY" => Self::Tiny,
            "SHORT" => Self::Short,
            "INT24" => Self::Int24,
            "LONG" => Self::Long,
            "LONGLONG" => Self::LongLong,
            "YEAR" => Self::Year,
            "INTERVAL" => Self::Interval,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DATETIME" => Self::DateTime,
            "DATE" => Self::Date,
            "TIMESTAMP" => Self::Timestamp,
            "TIME" => Self::Time,
            "VAR_STRING" | "STRING" => Self::Passthrough,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the normalizer for this type, or `None` for passthrough.
    pub const fn normalizer(&self) -> Option<Normalizer> {
        match self {
            Self::Bit
            | Self::Tiny
            | Self::Short
            | Self::Int24
            | Self::Long
            | Self::LongLong
            | Self::Year
            | Self::Interval => Some(Normalizer::Int),
            Self::Float | Self::Double => Some(Normalizer::Float),
            Self::DateTime | Self::Date => Some(Normalizer::LocalDateTime),
            Self::Timestamp => Some(Normalizer::ZonedDateTime(ZoneQualifier::Connection)),
            Self::Time => Some(Normalizer::Time),
            Self::Passthrough | Self::Other(_) => None,
        }
    }
}

/// Resolves normalizers for MySQL results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MysqlResultNormalizerFactory {
    zones: TimeZones,
}

impl MysqlResultNormalizerFactory {
    /// Creates a factory that converts `TIMESTAMP` values from
    /// `zones.connection` to `zones.application`.
    pub const fn new(zones: TimeZones) -> Self {
        Self { zones }
    }
}

impl ResultNormalizerFactory for MysqlResultNormalizerFactory {
    fn time_zones(&self) -> TimeZones {
        self.zones
    }

    fn normalizer_for(&self, type_tag: &str) -> Option<Normalizer> {
        MysqlColumnType::from_tag(type_tag).normalizer()
    }
}

/// Parses a MySQL `TIME` value (`[-]HHH:MM:SS[.ffffff]`) into an interval.
///
/// Hours may exceed 24. A fractional part is ignored. A negative value
/// keeps its magnitude and sets [`Interval::inverted`].
///
/// # Errors
///
/// Returns [`DbalError::InvalidTimeFormat`] carrying the raw value when it
/// does not start with `[-]H:M:S` or its total overflows.
pub fn parse_time(raw: &str) -> DbalResult<Interval> {
    static TIME: OnceLock<Regex> = OnceLock::new();

    let re = TIME.get_or_init(|| Regex::new(r"^(-?)(\d+):(\d+):(\d+)").expect("valid regex"));
    let invalid = || DbalError::InvalidTimeFormat {
        value: raw.to_string(),
    };

    let caps = re.captures(raw).ok_or_else(invalid)?;
    let component = |i: usize| caps[i].parse::<i64>().map_err(|_| invalid());
    let (hours, minutes, seconds) = (component(2)?, component(3)?, component(4)?);

    Interval::from_hms(hours, minutes, seconds, &caps[1] == "-").ok_or_else(invalid)
}

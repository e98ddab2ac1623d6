//! PostgreSQL result normalization.
//!
//! PostgreSQL reports type names from `pg_type` (`int4`, `timestamptz`,
//! `bytea`, ...) and sends every value in its text output format. This
//! module maps those names onto [`Normalizer`]s and holds the text decoders
//! for the PostgreSQL-specific formats: booleans, intervals, bit strings
//! and `bytea`.
//!
//! Datetimes without an explicit offset are read in the application zone.

use dbal_rs_core::TimeZones;

use crate::normalizer::{Normalizer, ResultNormalizerFactory, ZoneQualifier};
use crate::value::Interval;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;

/// A PostgreSQL column type as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PgsqlColumnType {
    /// `int2`
    Int2,
    /// `int4`
    Int4,
    /// `int8`
    Int8,
    /// `numeric`
    Numeric,
    /// `float4`
    Float4,
    /// `float8`
    Float8,
    /// `bool`
    Bool,
    /// `time`
    Time,
    /// `timetz`
    TimeTz,
    /// `date`
    Date,
    /// `timestamp`
    Timestamp,
    /// `timestamptz`
    TimestampTz,
    /// `interval`
    Interval,
    /// `bit`
    Bit,
    /// `varbit`
    VarBit,
    /// `bytea`
    Bytea,
    /// `varchar`: text that is already canonical.
    Passthrough,
    /// Any other type name. Values pass through unchanged.
    Other(String),
}

impl PgsqlColumnType {
    /// Parses a driver type name. Unknown names become [`Self::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "int2" => Self::Int2,
            "int4" => Self::Int4,
            "int8" => Self::Int8,
            "numeric" => Self::Numeric,
            "float4" => Self::Float4,
            "float8" => Self::Float8,
            "bool" => Self::Bool,
            "time" => Self::Time,
            "timetz" => Self::TimeTz,
            "date" => Self::Date,
            "timestamp" => Self::Timestamp,
            "timestamptz" => Self::TimestampTz,
            "interval" => Self::Interval,
            "bit" => Self::Bit,
            "varbit" => Self::VarBit,
            "bytea" => Self::Bytea,
            "varchar" => Self::Passthrough,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the normalizer for this type, or `None` for passthrough.
    pub const fn normalizer(&self) -> Option<Normalizer> {
        match self {
            Self::Int2 | Self::Int4 | Self::Int8 => Some(Normalizer::Int),
            Self::Numeric | Self::Float4 | Self::Float8 => Some(Normalizer::Float),
            Self::Bool => Some(Normalizer::Bool),
            Self::Time | Self::TimeTz | Self::Date | Self::Timestamp | Self::TimestampTz => {
                Some(Normalizer::ZonedDateTime(ZoneQualifier::Application))
            }
            Self::Interval => Some(Normalizer::Interval),
            Self::Bit | Self::VarBit => Some(Normalizer::BitString),
            Self::Bytea => Some(Normalizer::Bytea),
            Self::Passthrough | Self::Other(_) => None,
        }
    }
}

/// Resolves normalizers for PostgreSQL results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgsqlResultNormalizerFactory {
    zones: TimeZones,
}

impl PgsqlResultNormalizerFactory {
    /// Creates a factory expressing datetimes in `zones.application`.
    pub const fn new(zones: TimeZones) -> Self {
        Self { zones }
    }
}

impl ResultNormalizerFactory for PgsqlResultNormalizerFactory {
    fn time_zones(&self) -> TimeZones {
        self.zones
    }

    fn normalizer_for(&self, type_tag: &str) -> Option<Normalizer> {
        PgsqlColumnType::from_tag(type_tag).normalizer()
    }
}

// ── Booleans ───────────────────────────────────────────────────────────

/// Reads PostgreSQL boolean text. Anything not recognized as true is false.
pub fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.to_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "on" | "1"
    )
}

// ── Bit strings ────────────────────────────────────────────────────────

/// Decodes `bit`/`varbit` text as a base-2 integer.
///
/// Characters other than `0` and `1` are ignored and an empty string is 0.
/// Values with more than 63 significant bits do not fit and yield `None`.
pub fn parse_bit_string(raw: &str) -> Option<i64> {
    let bits: String = raw.chars().filter(|c| matches!(c, '0' | '1')).collect();
    let significant = bits.trim_start_matches('0');
    if significant.is_empty() {
        return Some(0);
    }
    if significant.len() > 63 {
        return None;
    }
    i64::from_str_radix(significant, 2).ok()
}

// ── bytea ──────────────────────────────────────────────────────────────

/// Reverses the server's `bytea` text output.
///
/// Handles the hex form (`\x` followed by two hex digits per byte) and the
/// legacy escape form, where `\\` is a backslash, `\ooo` is an octal byte,
/// and every other byte stands for itself. In the hex form, whitespace
/// between pairs is skipped and a malformed pair ends decoding.
pub fn unescape_bytea(raw: &str) -> Vec<u8> {
    match raw.strip_prefix("\\x") {
        Some(hex) => decode_hex(hex),
        None => decode_escaped(raw.as_bytes()),
    }
}

fn decode_hex(hex: &str) -> Vec<u8> {
    let digits: Vec<u8> = hex
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    let mut out = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks(2) {
        let byte = match pair {
            [hi, lo] => hex_digit(*hi).zip(hex_digit(*lo)).map(|(h, l)| (h << 4) | l),
            _ => None,
        };
        match byte {
            Some(byte) => out.push(byte),
            None => {
                tracing::warn!(value = hex, "malformed bytea hex text truncated");
                break;
            }
        }
    }
    out
}

const fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn decode_escaped(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if bytes.get(i + 1) == Some(&b'\\') {
                out.push(b'\\');
                i += 2;
                continue;
            }
            if let Some(byte) = bytes.get(i + 1..i + 4).and_then(octal_byte) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn octal_byte(digits: &[u8]) -> Option<u8> {
    match digits {
        [a @ b'0'..=b'3', b @ b'0'..=b'7', c @ b'0'..=b'7'] => {
            Some(((a - b'0') << 6) | ((b - b'0') << 3) | (c - b'0'))
        }
        _ => None,
    }
}

// ── Intervals ──────────────────────────────────────────────────────────

/// Parses interval text in any of the server's output styles.
///
/// * `postgres`: `1 year 2 mons -3 days +04:05:06.5`
/// * `postgres_verbose`: `@ 1 year 2 mons 3 days 4 hours 5 mins 6.5 secs ago`
/// * `iso_8601`: `P1Y2M3DT4H5M6.5S`
///
/// Returns `None` when the text matches none of them.
pub fn parse_interval(raw: &str) -> Option<Interval> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let parsed = match text.strip_prefix('P') {
        Some(rest) => parse_iso_interval(rest),
        None => parse_postgres_interval(text),
    };
    if parsed.is_none() {
        tracing::warn!(value = raw, "unparseable interval normalized to null");
    }
    parsed
}

#[derive(Default)]
struct IntervalBuilder {
    months: i32,
    days: i32,
    micros: i64,
}

impl IntervalBuilder {
    fn add_months(&mut self, n: i64) -> Option<()> {
        self.months = self.months.checked_add(i32::try_from(n).ok()?)?;
        Some(())
    }

    fn add_days(&mut self, n: i64) -> Option<()> {
        self.days = self.days.checked_add(i32::try_from(n).ok()?)?;
        Some(())
    }

    fn add_micros(&mut self, n: i64) -> Option<()> {
        self.micros = self.micros.checked_add(n)?;
        Some(())
    }

    /// Adds `amount` of `unit`. Only time units accept a fraction.
    fn add(&mut self, amount: &str, unit: &str) -> Option<()> {
        let whole = || amount.parse::<i64>().ok();
        match unit {
            "year" | "years" | "yr" | "yrs" | "y" => self.add_months(whole()?.checked_mul(12)?),
            "mon" | "mons" | "month" | "months" | "m" => self.add_months(whole()?),
            "week" | "weeks" | "w" => self.add_days(whole()?.checked_mul(7)?),
            "day" | "days" | "d" => self.add_days(whole()?),
            "hour" | "hours" | "hr" | "hrs" | "h" => {
                self.add_micros(scaled_micros(amount, MICROS_PER_HOUR)?)
            }
            "min" | "mins" | "minute" | "minutes" => {
                self.add_micros(scaled_micros(amount, MICROS_PER_MINUTE)?)
            }
            "sec" | "secs" | "second" | "seconds" | "s" => {
                self.add_micros(scaled_micros(amount, MICROS_PER_SECOND)?)
            }
            _ => None,
        }
    }

    fn negate(&mut self) -> Option<()> {
        self.months = self.months.checked_neg()?;
        self.days = self.days.checked_neg()?;
        self.micros = self.micros.checked_neg()?;
        Some(())
    }

    const fn build(self) -> Interval {
        Interval::new(self.months, self.days, self.micros)
    }
}

fn parse_postgres_interval(text: &str) -> Option<Interval> {
    let (body, verbose) = match text.strip_prefix('@') {
        Some(rest) => (rest.trim(), true),
        None => (text, false),
    };
    let (body, ago) = match body.strip_suffix("ago") {
        Some(rest) if verbose => (rest.trim_end(), true),
        _ => (body, false),
    };

    let mut builder = IntervalBuilder::default();
    let mut tokens = body.split_whitespace();
    let mut seen = false;
    while let Some(token) = tokens.next() {
        if token.contains(':') {
            builder.add_micros(clock_micros(token)?)?;
        } else {
            builder.add(token, tokens.next()?)?;
        }
        seen = true;
    }
    if !seen {
        return None;
    }
    if ago {
        builder.negate()?;
    }
    Some(builder.build())
}

fn parse_iso_interval(rest: &str) -> Option<Interval> {
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) if !time.is_empty() => (date, Some(time)),
        Some(_) => return None,
        None => (rest, None),
    };
    if date_part.is_empty() && time_part.is_none() {
        return None;
    }

    let mut builder = IntervalBuilder::default();
    for (amount, designator) in iso_components(date_part)? {
        let unit = match designator {
            'Y' => "y",
            'M' => "m",
            'W' => "w",
            'D' => "d",
            _ => return None,
        };
        builder.add(amount, unit)?;
    }
    for (amount, designator) in iso_components(time_part.unwrap_or_default())? {
        let unit = match designator {
            'H' => "h",
            'M' => "min",
            'S' => "s",
            _ => return None,
        };
        builder.add(amount, unit)?;
    }
    Some(builder.build())
}

/// Splits `1Y-2M3.5D` into `[("1", 'Y'), ("-2", 'M'), ("3.5", 'D')]`.
fn iso_components(text: &str) -> Option<Vec<(&str, char)>> {
    let mut components = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c.is_ascii_alphabetic() {
            let amount = &text[start..i];
            if amount.is_empty() {
                return None;
            }
            components.push((amount, c));
            start = i + c.len_utf8();
        }
    }
    (start == text.len()).then_some(components)
}

/// Parses `[+-]H:MM[:SS[.f]]` into microseconds.
fn clock_micros(token: &str) -> Option<i64> {
    let (negative, body) = split_sign(token);
    let mut parts = body.split(':');
    let hours = parts.next()?.parse::<i64>().ok()?;
    let minutes = parts.next()?.parse::<i64>().ok()?;
    let seconds = match parts.next() {
        Some(s) => scaled_micros(s, MICROS_PER_SECOND)?,
        None => 0,
    };
    if parts.next().is_some() || seconds < 0 {
        return None;
    }

    let micros = hours
        .checked_mul(MICROS_PER_HOUR)?
        .checked_add(minutes.checked_mul(MICROS_PER_MINUTE)?)?
        .checked_add(seconds)?;
    Some(if negative { -micros } else { micros })
}

/// Parses a decimal like `-6.5` and multiplies it by `scale` microseconds,
/// keeping up to microsecond precision.
fn scaled_micros(amount: &str, scale: i64) -> Option<i64> {
    let (negative, body) = split_sign(amount);
    let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole = if whole.is_empty() { 0 } else { whole.parse::<i64>().ok()? };
    let mut micros = whole.checked_mul(scale)?;
    // Fractions finer than a microsecond of the unit are dropped.
    let mut place = scale;
    for digit in fraction.bytes() {
        place /= 10;
        if place == 0 {
            break;
        }
        micros = micros.checked_add(i64::from(digit - b'0') * place)?;
    }
    Some(if negative { -micros } else { micros })
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text.strip_prefix('+').unwrap_or(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use dbal_rs_core::Zone;

    const HOUR: i64 = MICROS_PER_HOUR;
    const MINUTE: i64 = MICROS_PER_MINUTE;
    const SECOND: i64 = MICROS_PER_SECOND;

    #[test]
    fn test_normalizer_table() {
        let factory = PgsqlResultNormalizerFactory::new(TimeZones::default());
        for tag in ["int2", "int4", "int8"] {
            assert_eq!(factory.normalizer_for(tag), Some(Normalizer::Int), "{tag}");
        }
        for tag in ["numeric", "float4", "float8"] {
            assert_eq!(factory.normalizer_for(tag), Some(Normalizer::Float), "{tag}");
        }
        for tag in ["time", "date", "timestamp", "timetz", "timestamptz"] {
            assert_eq!(
                factory.normalizer_for(tag),
                Some(Normalizer::ZonedDateTime(ZoneQualifier::Application)),
                "{tag}"
            );
        }
        assert_eq!(factory.normalizer_for("bool"), Some(Normalizer::Bool));
        assert_eq!(factory.normalizer_for("interval"), Some(Normalizer::Interval));
        assert_eq!(factory.normalizer_for("bit"), Some(Normalizer::BitString));
        assert_eq!(factory.normalizer_for("varbit"), Some(Normalizer::BitString));
        assert_eq!(factory.normalizer_for("bytea"), Some(Normalizer::Bytea));
        assert_eq!(factory.normalizer_for("varchar"), None);
        assert_eq!(factory.normalizer_for("jsonb"), None);
    }

    #[test]
    fn test_from_tag_known() {
        assert_eq!(PgsqlColumnType::from_tag("int8"), PgsqlColumnType::Int8);
        assert_eq!(PgsqlColumnType::from_tag("timetz"), PgsqlColumnType::TimeTz);
        assert_eq!(
            PgsqlColumnType::from_tag("timestamptz"),
            PgsqlColumnType::TimestampTz
        );
        assert_eq!(PgsqlColumnType::from_tag("varbit"), PgsqlColumnType::VarBit);
        assert_eq!(PgsqlColumnType::from_tag("bytea"), PgsqlColumnType::Bytea);
    }

    #[test]
    fn test_from_tag_varchar_is_passthrough() {
        assert_eq!(PgsqlColumnType::from_tag("varchar"), PgsqlColumnType::Passthrough);
        assert_eq!(
            PgsqlColumnType::from_tag("uuid"),
            PgsqlColumnType::Other("uuid".to_string())
        );
    }

    #[test]
    fn test_parse_bool_true_values() {
        for raw in ["true", "t", "yes", "y", "on", "1", "TRUE", "On", "T"] {
            assert!(parse_bool(raw), "{raw}");
        }
    }

    #[test]
    fn test_parse_bool_false_values() {
        for raw in ["false", "f", "no", "n", "off", "0", "", "maybe"] {
            assert!(!parse_bool(raw), "{raw}");
        }
    }

    #[test]
    fn test_parse_bit_string() {
        assert_eq!(parse_bit_string("101"), Some(5));
        assert_eq!(parse_bit_string("0000"), Some(0));
        assert_eq!(parse_bit_string(""), Some(0));
        assert_eq!(parse_bit_string("1x0y1"), Some(5));
        assert_eq!(parse_bit_string(&"1".repeat(63)), Some(i64::MAX));
        assert_eq!(parse_bit_string(&format!("000{}", "1".repeat(63))), Some(i64::MAX));
        assert_eq!(parse_bit_string(&"1".repeat(64)), None);
    }

    #[test]
    fn test_unescape_bytea_hex() {
        assert_eq!(unescape_bytea("\\x00ff41"), vec![0x00, 0xFF, 0x41]);
        assert_eq!(unescape_bytea("\\xDEADbeef"), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(unescape_bytea("\\x"), Vec::<u8>::new());
    }

    #[test]
    fn test_unescape_bytea_hex_malformed_truncates() {
        assert_eq!(unescape_bytea("\\x41zz42"), vec![0x41]);
        assert_eq!(unescape_bytea("\\x414"), vec![0x41]);
    }

    #[test]
    fn test_unescape_bytea_escape_form() {
        assert_eq!(unescape_bytea("\\000\\377A"), vec![0x00, 0xFF, 0x41]);
        assert_eq!(unescape_bytea("a\\\\b"), b"a\\b".to_vec());
        assert_eq!(unescape_bytea("plain"), b"plain".to_vec());
    }

    #[test]
    fn test_unescape_bytea_lone_backslash_is_literal() {
        assert_eq!(unescape_bytea("a\\9"), b"a\\9".to_vec());
        assert_eq!(unescape_bytea("end\\"), b"end\\".to_vec());
    }

    #[test]
    fn test_parse_interval_postgres_style() {
        assert_eq!(
            parse_interval("1 year 2 mons 3 days 04:05:06.5"),
            Some(Interval::new(14, 3, 4 * HOUR + 5 * MINUTE + 6 * SECOND + 500_000))
        );
        assert_eq!(
            parse_interval("-1 days +02:00:00"),
            Some(Interval::new(0, -1, 2 * HOUR))
        );
        assert_eq!(parse_interval("-00:00:01"), Some(Interval::new(0, 0, -SECOND)));
        assert_eq!(parse_interval("3 days"), Some(Interval::new(0, 3, 0)));
    }

    #[test]
    fn test_parse_interval_verbose_style() {
        assert_eq!(
            parse_interval("@ 1 year 2 mons 3 days 4 hours 5 mins 6.5 secs"),
            Some(Interval::new(14, 3, 4 * HOUR + 5 * MINUTE + 6 * SECOND + 500_000))
        );
        assert_eq!(
            parse_interval("@ 2 days 1 hour ago"),
            Some(Interval::new(0, -2, -HOUR))
        );
    }

    #[test]
    fn test_parse_interval_iso_style() {
        assert_eq!(
            parse_interval("P1Y2M3DT4H5M6.5S"),
            Some(Interval::new(14, 3, 4 * HOUR + 5 * MINUTE + 6 * SECOND + 500_000))
        );
        assert_eq!(parse_interval("P2W"), Some(Interval::new(0, 14, 0)));
        assert_eq!(parse_interval("PT-1.5S"), Some(Interval::new(0, 0, -1_500_000)));
        assert_eq!(parse_interval("P-1Y-2M"), Some(Interval::new(-14, 0, 0)));
    }

    #[test]
    fn test_parse_interval_unparseable() {
        assert_eq!(parse_interval(""), None);
        assert_eq!(parse_interval("soon"), None);
        assert_eq!(parse_interval("3 fortnights"), None);
        assert_eq!(parse_interval("P"), None);
        assert_eq!(parse_interval("PT"), None);
        assert_eq!(parse_interval("P1X"), None);
        assert_eq!(parse_interval("1 year ago"), None);
    }

    #[test]
    fn test_interval_normalizer_null_on_failure() {
        let zones = TimeZones::default();
        assert_eq!(
            Normalizer::Interval.normalize(Some("bogus"), &zones).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_datetime_without_offset_uses_application_zone() {
        let zone: Zone = "+02:00".parse().unwrap();
        let factory = PgsqlResultNormalizerFactory::new(TimeZones::uniform(zone));
        let normalizer = factory.normalizer_for("timestamp").unwrap();
        let value = normalizer
            .normalize(Some("2024-01-02 03:04:05"), &factory.time_zones())
            .unwrap();
        assert_eq!(value.to_string(), "2024-01-02T03:04:05+02:00");
    }

    #[test]
    fn test_datetime_with_offset_converted_to_application_zone() {
        let zone: Zone = "+02:00".parse().unwrap();
        let factory = PgsqlResultNormalizerFactory::new(TimeZones::uniform(zone));
        let normalizer = factory.normalizer_for("timestamptz").unwrap();
        let value = normalizer
            .normalize(Some("2024-01-02 03:04:05+00"), &factory.time_zones())
            .unwrap();
        assert_eq!(value.to_string(), "2024-01-02T05:04:05+02:00");
    }

    #[test]
    fn test_time_only_anchored_on_epoch_date() {
        let factory = PgsqlResultNormalizerFactory::new(TimeZones::default());
        let value = Normalizer::ZonedDateTime(ZoneQualifier::Application)
            .normalize(Some("12:30:00"), &factory.time_zones())
            .unwrap();
        assert_eq!(value.to_string(), "1970-01-01T12:30:00+00:00");
    }

    #[test]
    fn test_infinity_passes_through() {
        let zones = TimeZones::default();
        let value = Normalizer::ZonedDateTime(ZoneQualifier::Application)
            .normalize(Some("infinity"), &zones)
            .unwrap();
        assert_eq!(value, Value::String("infinity".into()));
    }
}

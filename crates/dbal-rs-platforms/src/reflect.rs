//! Helpers for reading introspection rows.
//!
//! Catalog columns arrive already normalized, but their exact [`Value`]
//! variant depends on the backend and server version (`YES`/`NO` text on
//! one, booleans on the other), so these readers accept every reasonable
//! shape.

use dbal_rs_core::{DbalError, DbalResult};
use dbal_rs_drivers::pgsql::parse_bool;
use dbal_rs_drivers::{Row, Value};

/// Reads a required text column.
pub(crate) fn text(row: &Row, column: &str) -> DbalResult<String> {
    opt_text(row, column)?.ok_or_else(|| {
        DbalError::DatabaseError(format!("Column '{column}' is unexpectedly NULL"))
    })
}

/// Reads a nullable text column.
pub(crate) fn opt_text(row: &Row, column: &str) -> DbalResult<Option<String>> {
    Ok(match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    })
}

/// Reads a boolean column. NULL is false.
pub(crate) fn flag(row: &Row, column: &str) -> DbalResult<bool> {
    Ok(match row.get(column)? {
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::String(s) => parse_bool(s),
        _ => false,
    })
}

/// Reads a non-negative size column. NULL and out-of-range values are `None`.
pub(crate) fn size(row: &Row, column: &str) -> DbalResult<Option<u32>> {
    Ok(match row.get(column)? {
        Value::Int(i) => u32::try_from(*i).ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

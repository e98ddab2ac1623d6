//! Core error types for dbal-rs.
//!
//! This module provides the [`DbalError`] enum shared by every crate in the
//! workspace. Normalizers, drivers, platforms, and cache stores all return
//! [`DbalResult`], and errors raised by an underlying driver, platform, or
//! store are propagated unchanged through the layers above them.

use thiserror::Error;

/// The primary error type for dbal-rs.
///
/// Each variant belongs to one of a few categories: value normalization,
/// database access, caching, and configuration.
#[derive(Error, Debug)]
pub enum DbalError {
    // ── Normalization ────────────────────────────────────────────────

    /// A MySQL `TIME` value did not match `[-]HH:MM:SS`.
    ///
    /// This is the only hard failure raised while normalizing a result; the
    /// offending raw value is kept so it can be surfaced to the caller.
    #[error("Unsupported value format for TIME column: {value}. Unable to parse to an interval")]
    InvalidTimeFormat {
        /// The raw value as received from the driver.
        value: String,
    },

    /// A timezone name or offset could not be resolved.
    #[error("Invalid time zone: {0}")]
    InvalidTimeZone(String),

    // ── Database ─────────────────────────────────────────────────────

    /// A generic database error reported by a driver.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A result row was asked for a column it does not have.
    #[error("Column '{0}' not found in row")]
    ColumnNotFound(String),

    // ── Cache ────────────────────────────────────────────────────────

    /// The metadata cache store failed.
    #[error("Cache error: {0}")]
    CacheError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DbalError {
    /// Returns `true` for errors raised while normalizing a result value.
    pub const fn is_normalization_error(&self) -> bool {
        matches!(self, Self::InvalidTimeFormat { .. })
    }
}

impl From<serde_json::Error> for DbalError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, DbalError>`.
pub type DbalResult<T> = Result<T, DbalError>;

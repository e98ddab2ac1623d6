//! # dbal-rs-drivers
//!
//! Driver abstraction and result normalization for dbal-rs. Drivers hand
//! back every column value as raw text plus a native type tag; this crate
//! turns those into canonical [`Value`](value::Value)s.
//!
//! ## Module Overview
//!
//! - [`value`] - The canonical [`Value`](value::Value) and [`Interval`](value::Interval) types
//! - [`normalizer`] - [`Normalizer`](normalizer::Normalizer), [`NormalizerMap`](normalizer::NormalizerMap) and the factory trait
//! - [`mysql`] - MySQL type tags and normalizer factory
//! - [`pgsql`] - PostgreSQL type tags, normalizer factory and text decoders
//! - [`result`] - Raw driver results and normalized rows
//! - [`driver`] - The async [`Driver`](driver::Driver) trait
//! - [`connection`] - [`Connection`](connection::Connection) and its query log
//! - [`memory`] - An in-memory driver with canned responses

// These clippy lints are intentionally allowed for the drivers crate:
// - cast_possible_truncation: row counts are widened from usize to u64
// - doc_markdown: backtick requirements for type tags in docs are too strict
// - missing_const_for_fn: several accessors may grow non-const bodies
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]

pub mod connection;
pub mod driver;
pub mod memory;
pub mod mysql;
pub mod normalizer;
pub mod pgsql;
pub mod result;
pub mod value;

pub use connection::{Connection, QueryLog, QueryLogEntry};
pub use driver::Driver;
pub use mysql::MysqlResultNormalizerFactory;
pub use normalizer::{Normalizer, NormalizerMap, ResultNormalizerFactory};
pub use pgsql::PgsqlResultNormalizerFactory;
pub use result::{ColumnTypeDescriptor, RawResult, ResultSet, Row};
pub use value::{Interval, Value};

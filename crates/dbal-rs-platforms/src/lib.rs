//! # dbal-rs-platforms
//!
//! Schema reflection for dbal-rs. A [`Platform`] describes the tables,
//! columns, foreign keys and primary-key sequences of one database;
//! [`CachedPlatform`] memoizes any platform's answers in a cache store.
//!
//! ## Module Overview
//!
//! - [`platform`] - The async [`Platform`] trait
//! - [`feature`] - Capability flags ([`Feature`])
//! - [`data`] - Schema descriptors: [`Table`], [`Column`], [`ForeignKey`], [`Fqn`]
//! - [`cache`] - The [`CacheBackend`](cache::CacheBackend) trait and stores
//! - [`cached`] - The [`CachedPlatform`] decorator
//! - [`mysql`] - MySQL reflection
//! - [`postgres`] - PostgreSQL reflection

// These clippy lints are intentionally allowed for the platforms crate:
// - doc_markdown: backtick requirements for catalog names in docs are too strict
// - missing_const_for_fn: accessors may grow non-const bodies
// - too_many_lines: introspection queries are long string literals
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::too_many_lines)]

pub mod cache;
pub mod cached;
pub mod data;
pub mod feature;
pub mod mysql;
pub mod platform;
pub mod postgres;
mod reflect;

pub use cache::{CacheBackend, CacheLookup, CacheValue, DummyCache, InMemoryCache};
pub use cached::{CachedPlatform, CACHE_VERSION};
pub use data::{Column, ForeignKey, Fqn, Table};
pub use feature::Feature;
pub use mysql::MysqlPlatform;
pub use platform::Platform;
pub use postgres::PostgresPlatform;

//! # dbal-rs
//!
//! A database abstraction layer for MySQL and PostgreSQL.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `dbal-rs` to get everything, or depend on individual
//! crates for finer-grained control.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dbal_rs::platforms::{CachedPlatform, InMemoryCache, Platform, PostgresPlatform};
//! use dbal_rs::drivers::Connection;
//!
//! async fn columns(connection: Arc<Connection>) -> dbal_rs::DbalResult<()> {
//!     let platform = CachedPlatform::new(
//!         Arc::new(PostgresPlatform::new(connection)),
//!         Arc::new(InMemoryCache::new()),
//!     );
//!     let columns = platform.get_columns("public.books").await?;
//!     println!("{} columns", columns.len());
//!     Ok(())
//! }
//! ```

/// Settings, errors, logging, and timezones.
pub use dbal_rs_core as core;

/// Driver trait, connections, and result normalization.
#[cfg(feature = "drivers")]
pub use dbal_rs_drivers as drivers;

/// Schema reflection and the metadata cache.
#[cfg(feature = "platforms")]
pub use dbal_rs_platforms as platforms;

pub use dbal_rs_core::{DbalError, DbalResult, Settings, TimeZones, Zone};

// Third-party re-exports
pub use async_trait::async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// Commonly used types, importable with `use dbal_rs::prelude::*`.
pub mod prelude {
    pub use dbal_rs_core::{DbalError, DbalResult, Settings, TimeZones, Zone};

    #[cfg(feature = "drivers")]
    pub use dbal_rs_drivers::{
        Connection, Driver, MysqlResultNormalizerFactory, PgsqlResultNormalizerFactory,
        ResultNormalizerFactory, Row, Value,
    };

    #[cfg(feature = "platforms")]
    pub use dbal_rs_platforms::{
        CacheBackend, CachedPlatform, Feature, InMemoryCache, MysqlPlatform, Platform,
        PostgresPlatform,
    };
}

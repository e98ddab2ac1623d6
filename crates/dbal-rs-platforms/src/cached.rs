//! A caching decorator for platforms.
//!
//! [`CachedPlatform`] wraps any [`Platform`] and memoizes its reflection
//! results in a [`CacheBackend`]. Entries are keyed by
//! `{version}.{operation}[.{argument}]`:
//!
//! | Operation | Key |
//! |---|---|
//! | `get_tables(None)` | `v2.tables` |
//! | `get_tables(Some("app"))` | `v2.tables.app` |
//! | `get_columns("books")` | `v2.columns.books` |
//! | `get_foreign_keys("books")` | `v2.foreign_keys.books` |
//! | `get_primary_sequence_name("books")` | `v2.sequence.books` |
//!
//! Bumping the version makes every earlier entry unreachable. Nothing is
//! invalidated automatically; call [`CachedPlatform::clear_cache`] after a
//! schema change. That clears the whole store, so the decorator should own
//! a store of its own.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use dbal_rs_core::settings::CacheSettings;
use dbal_rs_core::DbalResult;

use crate::cache::{CacheBackend, CacheLookup, CacheValue};
use crate::data::{Column, ForeignKey, Table};
use crate::feature::Feature;
use crate::platform::Platform;

/// The default cache key version.
pub const CACHE_VERSION: &str = "v2";

/// A [`Platform`] that memoizes another platform's answers.
pub struct CachedPlatform {
    inner: Arc<dyn Platform>,
    cache: Arc<dyn CacheBackend>,
    version: String,
    ttl: Option<Duration>,
}

impl CachedPlatform {
    /// Wraps `inner`, storing entries in `cache` under [`CACHE_VERSION`].
    pub fn new(inner: Arc<dyn Platform>, cache: Arc<dyn CacheBackend>) -> Self {
        Self::with_version(inner, cache, CACHE_VERSION)
    }

    /// Wraps `inner` with an explicit key version.
    pub fn with_version(
        inner: Arc<dyn Platform>,
        cache: Arc<dyn CacheBackend>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            cache,
            version: version.into(),
            ttl: None,
        }
    }

    /// Wraps `inner` using the version and timeout from `settings`.
    pub fn from_settings(
        inner: Arc<dyn Platform>,
        cache: Arc<dyn CacheBackend>,
        settings: &CacheSettings,
    ) -> Self {
        let mut platform = Self::with_version(inner, cache, settings.version.clone());
        platform.ttl = settings.timeout.map(Duration::from_secs);
        platform
    }

    /// Sets how long entries live. `None` keeps them until cleared.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the key version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the wrapped platform.
    pub fn inner(&self) -> &Arc<dyn Platform> {
        &self.inner
    }

    /// Evicts every entry from the store.
    pub async fn clear_cache(&self) -> DbalResult<()> {
        tracing::debug!(platform = self.inner.name(), "platform cache cleared");
        self.cache.clear().await
    }

    fn key(&self, operation: &str, argument: Option<&str>) -> String {
        match argument {
            Some(argument) => format!("{}.{operation}.{argument}", self.version),
            None => format!("{}.{operation}", self.version),
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> DbalResult<CacheLookup<T>> {
        let value = match self.cache.get(key).await? {
            CacheLookup::Hit(CacheValue::Json(value)) => value,
            CacheLookup::Hit(CacheValue::String(_)) => {
                tracing::warn!(key, "non-JSON platform cache entry ignored");
                return Ok(CacheLookup::Miss);
            }
            CacheLookup::Miss => return Ok(CacheLookup::Miss),
        };

        match serde_json::from_value(value) {
            Ok(decoded) => Ok(CacheLookup::Hit(decoded)),
            Err(e) => {
                tracing::warn!(key, error = %e, "stale platform cache entry recomputed");
                Ok(CacheLookup::Miss)
            }
        }
    }

    async fn cached<T, F, Fut>(&self, key: String, compute: F) -> DbalResult<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = DbalResult<T>> + Send,
    {
        if let CacheLookup::Hit(value) = self.lookup(&key).await? {
            tracing::debug!(key, "platform cache hit");
            return Ok(value);
        }

        tracing::debug!(key, "platform cache miss");
        let value = compute().await?;
        let stored = serde_json::to_value(&value)?;
        self.cache.set(&key, CacheValue::Json(stored), self.ttl).await?;
        Ok(value)
    }
}

#[async_trait::async_trait]
impl Platform for CachedPlatform {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get_tables(&self, schema: Option<&str>) -> DbalResult<HashMap<String, Table>> {
        let key = self.key("tables", schema);
        self.cached(key, || self.inner.get_tables(schema)).await
    }

    async fn get_columns(&self, table: &str) -> DbalResult<HashMap<String, Column>> {
        let key = self.key("columns", Some(table));
        self.cached(key, || self.inner.get_columns(table)).await
    }

    async fn get_foreign_keys(&self, table: &str) -> DbalResult<HashMap<String, ForeignKey>> {
        let key = self.key("foreign_keys", Some(table));
        self.cached(key, || self.inner.get_foreign_keys(table)).await
    }

    async fn get_primary_sequence_name(&self, table: &str) -> DbalResult<Option<String>> {
        let key = self.key("sequence", Some(table));
        self.cached(key, || self.inner.get_primary_sequence_name(table))
            .await
    }

    fn is_supported(&self, feature: Feature) -> bool {
        self.inner.is_supported(feature)
    }
}

impl std::fmt::Debug for CachedPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedPlatform")
            .field("platform", &self.inner.name())
            .field("version", &self.version)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;

    struct Named;

    #[async_trait::async_trait]
    impl Platform for Named {
        fn name(&self) -> &str {
            "named"
        }

        async fn get_tables(&self, _schema: Option<&str>) -> DbalResult<HashMap<String, Table>> {
            Ok(HashMap::new())
        }

        async fn get_columns(&self, _table: &str) -> DbalResult<HashMap<String, Column>> {
            Ok(HashMap::new())
        }

        async fn get_foreign_keys(&self, _table: &str) -> DbalResult<HashMap<String, ForeignKey>> {
            Ok(HashMap::new())
        }

        async fn get_primary_sequence_name(&self, _table: &str) -> DbalResult<Option<String>> {
            Ok(None)
        }

        fn is_supported(&self, feature: Feature) -> bool {
            feature == Feature::QUERY_EXPLAIN
        }
    }

    fn platform(version: &str) -> CachedPlatform {
        CachedPlatform::with_version(Arc::new(Named), Arc::new(InMemoryCache::new()), version)
    }

    #[test]
    fn test_keys() {
        let p = platform(CACHE_VERSION);
        assert_eq!(p.key("tables", None), "v2.tables");
        assert_eq!(p.key("tables", Some("app")), "v2.tables.app");
        assert_eq!(p.key("columns", Some("books")), "v2.columns.books");
        assert_eq!(p.key("foreign_keys", Some("a.b")), "v2.foreign_keys.a.b");
        assert_eq!(p.key("sequence", Some("books")), "v2.sequence.books");
    }

    #[test]
    fn test_keys_follow_version() {
        assert_eq!(platform("v3").key("tables", None), "v3.tables");
    }

    #[test]
    fn test_passthrough_methods() {
        let p = platform(CACHE_VERSION);
        assert_eq!(p.name(), "named");
        assert!(p.is_supported(Feature::QUERY_EXPLAIN));
        assert!(!p.is_supported(Feature::MULTI_COLUMN_IN));
    }

    #[test]
    fn test_from_settings() {
        let settings = CacheSettings {
            version: "v7".to_string(),
            timeout: Some(60),
        };
        let p = CachedPlatform::from_settings(Arc::new(Named), Arc::new(InMemoryCache::new()), &settings);
        assert_eq!(p.version(), "v7");
        assert_eq!(p.ttl, Some(Duration::from_secs(60)));
    }
}

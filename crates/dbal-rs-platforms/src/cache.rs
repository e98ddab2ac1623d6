//! Cache stores for platform metadata.
//!
//! This module provides the [`CacheBackend`] trait that
//! [`CachedPlatform`](crate::cached::CachedPlatform) persists reflected
//! metadata through, plus two stores:
//!
//! - [`InMemoryCache`] - Thread-safe in-memory store with TTL support
//! - [`DummyCache`] - Stores nothing; every lookup misses
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dbal_rs_platforms::cache::{CacheBackend, CacheValue, InMemoryCache};
//!
//! async fn example() {
//!     let cache = InMemoryCache::new();
//!     cache.set("v2.tables", CacheValue::Json(serde_json::json!({})), None).await.unwrap();
//!     assert!(cache.has_key("v2.tables").await.unwrap());
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use dbal_rs_core::DbalResult;

/// A value held by a cache store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheValue {
    /// Plain text.
    String(String),
    /// Serialized metadata.
    Json(serde_json::Value),
}

impl CacheValue {
    /// Returns the value as a string, if it is a `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Json(_) => None,
        }
    }

    /// Returns the JSON document, if it is a `Json` variant.
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::String(_) => None,
        }
    }
}

/// The outcome of a cache lookup.
///
/// A stored value that is itself "empty" (for example a sequence name that
/// does not exist) is still a [`Hit`](CacheLookup::Hit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// The key was present.
    Hit(T),
    /// The key was absent or expired.
    Miss,
}

impl<T> CacheLookup<T> {
    /// Returns `true` for a hit.
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// Converts into an `Option`, losing the hit/miss distinction for
    /// `Option` payloads.
    pub fn hit(self) -> Option<T> {
        match self {
            Self::Hit(v) => Some(v),
            Self::Miss => None,
        }
    }
}

impl<T> From<Option<T>> for CacheLookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Miss, Self::Hit)
    }
}

/// A store for cached values.
///
/// All methods are async and the trait requires `Send + Sync` to support
/// concurrent access from multiple tokio tasks.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Looks a key up. Expired entries are a miss.
    async fn get(&self, key: &str) -> DbalResult<CacheLookup<CacheValue>>;

    /// Stores a value with an optional TTL.
    ///
    /// If `ttl` is `None`, the value does not expire.
    async fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> DbalResult<()>;

    /// Deletes a value.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, key: &str) -> DbalResult<bool>;

    /// Removes all entries.
    async fn clear(&self) -> DbalResult<()>;

    /// Checks whether a live entry exists for a key.
    async fn has_key(&self, key: &str) -> DbalResult<bool>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CacheValue,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// A thread-safe in-memory cache store with TTL support.
///
/// Uses `RwLock<HashMap>` for concurrent read access. Expired entries are
/// ignored on read and swept on the next write. Clones share the same
/// storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl InMemoryCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.values().filter(|entry| !entry.is_expired()).count()
    }

    /// Returns `true` if there are no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> DbalResult<CacheLookup<CacheValue>> {
        let store = self.store.read().await;
        Ok(store
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
            .into())
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> DbalResult<()> {
        let mut store = self.store.write().await;
        store.retain(|_, entry| !entry.is_expired());
        let expires_at = ttl.map(|d| Instant::now() + d);
        store.insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> DbalResult<bool> {
        let mut store = self.store.write().await;
        Ok(store.remove(key).is_some())
    }

    async fn clear(&self) -> DbalResult<()> {
        self.store.write().await.clear();
        Ok(())
    }

    async fn has_key(&self, key: &str) -> DbalResult<bool> {
        let store = self.store.read().await;
        Ok(store.get(key).is_some_and(|entry| !entry.is_expired()))
    }
}

/// A store that keeps nothing.
///
/// Wrapping a platform with it disables metadata caching without changing
/// call sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyCache;

#[async_trait]
impl CacheBackend for DummyCache {
    async fn get(&self, _key: &str) -> DbalResult<CacheLookup<CacheValue>> {
        Ok(CacheLookup::Miss)
    }

    async fn set(&self, _key: &str, _value: CacheValue, _ttl: Option<Duration>) -> DbalResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> DbalResult<bool> {
        Ok(false)
    }

    async fn clear(&self) -> DbalResult<()> {
        Ok(())
    }

    async fn has_key(&self, _key: &str) -> DbalResult<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(v: serde_json::Value) -> CacheValue {
        CacheValue::Json(v)
    }

    // ── InMemoryCache ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();
        cache.set("k", json(serde_json::json!([1])), None).await.unwrap();
        assert_eq!(
            cache.get("k").await.unwrap(),
            CacheLookup::Hit(json(serde_json::json!([1])))
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_miss() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get("nope").await.unwrap(), CacheLookup::Miss);
        assert!(!cache.has_key("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_stored_null_is_hit() {
        let cache = InMemoryCache::new();
        cache.set("k", json(serde_json::Value::Null), None).await.unwrap();
        let lookup = cache.get("k").await.unwrap();
        assert!(lookup.is_hit());
        assert_eq!(lookup.hit().and_then(|v| v.as_json().cloned()), Some(serde_json::Value::Null));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();
        cache.set("k", CacheValue::String("v".into()), None).await.unwrap();
        assert!(cache.delete("k").await.unwrap());
        assert!(!cache.delete("k").await.unwrap());
        assert!(!cache.has_key("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = InMemoryCache::new();
        cache.set("a", CacheValue::String("1".into()), None).await.unwrap();
        cache.set("b", CacheValue::String("2".into()), None).await.unwrap();
        assert_eq!(cache.len().await, 2);
        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = InMemoryCache::new();
        cache
            .set("k", CacheValue::String("v".into()), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        assert!(cache.has_key("k").await.unwrap());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await.unwrap(), CacheLookup::Miss);
        assert!(!cache.has_key("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_entries_swept_on_write() {
        let cache = InMemoryCache::new();
        cache
            .set("old", CacheValue::String("v".into()), Some(Duration::from_millis(5)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.set("new", CacheValue::String("v".into()), None).await.unwrap();
        assert_eq!(cache.store.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let cache = InMemoryCache::new();
        let other = cache.clone();
        cache.set("k", CacheValue::String("v".into()), None).await.unwrap();
        assert!(other.has_key("k").await.unwrap());
    }

    // ── DummyCache ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_dummy_cache_never_hits() {
        let cache = DummyCache;
        cache.set("k", CacheValue::String("v".into()), None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), CacheLookup::Miss);
        assert!(!cache.has_key("k").await.unwrap());
        assert!(!cache.delete("k").await.unwrap());
        cache.clear().await.unwrap();
    }

    // ── CacheLookup ─────────────────────────────────────────────────

    #[test]
    fn test_lookup_from_option() {
        assert_eq!(CacheLookup::from(Some(1)), CacheLookup::Hit(1));
        assert_eq!(CacheLookup::<i32>::from(None), CacheLookup::Miss);
        assert_eq!(CacheLookup::Hit(Some(3)).hit(), Some(Some(3)));
        assert!(!CacheLookup::<()>::Miss.is_hit());
    }

    #[test]
    fn test_cache_value_accessors() {
        assert_eq!(CacheValue::String("x".into()).as_str(), Some("x"));
        assert!(CacheValue::String("x".into()).as_json().is_none());
        assert!(CacheValue::Json(serde_json::json!(1)).as_str().is_none());
    }
}

//! Typed cache handle

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use log::debug;

use super::CacheConfig;
use super::CacheProvider;
use super::CachedValue;
use super::InMemoryCache;
use super::KeyPattern;
use super::TtlTier;

/// A shared, typed handle over a [`CacheProvider`].
///
/// Values are stored type-erased and read back as the type the caller asks
/// for. A stored value of a different type reads as a miss. Cloning the
/// handle shares the underlying store.
///
/// # Example
///
/// ```
/// use erpdash_lib::cache::Cache;
///
/// let cache = Cache::in_memory();
/// cache.set("tenants", vec!["acme".to_string()]);
///
/// let tenants = cache.get::<Vec<String>>("tenants").unwrap();
/// assert_eq!(tenants.as_slice(), ["acme"]);
/// assert!(cache.get::<Vec<u32>>("tenants").is_none());
/// ```
#[derive(Clone)]
pub struct Cache {
    provider: Arc<dyn CacheProvider>,
    config: CacheConfig,
}

impl Cache {
    /// Creates an in-memory cache with default TTLs.
    pub fn in_memory() -> Self {
        Self::new(InMemoryCache::new(), CacheConfig::default())
    }

    /// Creates a cache over the given provider.
    pub fn new(provider: impl CacheProvider + 'static, config: CacheConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            config,
        }
    }

    /// Creates a cache over an already shared provider.
    pub fn from_shared(provider: Arc<dyn CacheProvider>, config: CacheConfig) -> Self {
        Self { provider, config }
    }

    /// Returns the TTL configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Reads a typed value.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.entry(key)?.downcast::<T>()
    }

    /// Reads the raw entry, with its timestamps.
    pub fn entry(&self, key: &str) -> Option<CachedValue> {
        self.provider.get(key)
    }

    /// Stores a value with the default TTL.
    pub fn set<T: Any + Send + Sync>(&self, key: &str, value: T) -> CachedValue {
        self.set_shared(key, Arc::new(value), TtlTier::Default)
    }

    /// Stores a value with an explicit TTL.
    pub fn set_with_ttl<T: Any + Send + Sync>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> CachedValue {
        let value = CachedValue::from_value(value, ttl);
        self.provider.set(key, value.clone());
        value
    }

    /// Stores an already shared value using the TTL of the given tier.
    ///
    /// Returns the stored entry so callers can report its timestamps.
    pub fn set_shared<T: Any + Send + Sync>(
        &self,
        key: &str,
        value: Arc<T>,
        tier: TtlTier,
    ) -> CachedValue {
        let value = CachedValue::with_ttl(value, self.config.ttl(tier));
        self.provider.set(key, value.clone());
        debug!("cached {} for {:?}", key, value.ttl);
        value
    }

    /// Returns `true` if a live entry exists. Evicts it if expired.
    pub fn has(&self, key: &str) -> bool {
        self.provider.has(key)
    }

    /// Removes one entry.
    pub fn invalidate(&self, key: &str) {
        debug!("invalidating {}", key);
        self.provider.remove(key);
    }

    /// Removes every entry whose key matches the pattern.
    pub fn invalidate_pattern(&self, pattern: &KeyPattern) -> usize {
        let removed = self.provider.remove_matching(pattern);
        debug!("invalidated {} entries matching {}", removed, pattern);
        removed
    }

    /// Removes every entry.
    pub fn clear(&self) {
        debug!("clearing cache");
        self.provider.clear();
    }

    /// Removes all expired entries.
    pub fn gc(&self) -> usize {
        self.provider.gc()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.provider.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.provider.is_empty()
    }

    /// Snapshot of the stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = self.provider.keys();
        keys.sort();
        keys
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("entries", &self.provider.len())
            .field("config", &self.config)
            .finish()
    }
}

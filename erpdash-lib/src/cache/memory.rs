//! In-memory cache implementation using DashMap

use dashmap::DashMap;
use log::trace;

use super::CacheProvider;
use super::CachedValue;
use super::KeyPattern;

/// An in-memory cache backed by a concurrent hash map.
///
/// This is the default cache implementation. Data lives as long as the
/// process does.
///
/// # Example
///
/// ```
/// use erpdash_lib::cache::InMemoryCache;
///
/// let cache = InMemoryCache::new();
/// ```
#[derive(Debug, Default)]
pub struct InMemoryCache {
    store: DashMap<String, CachedValue>,
}

impl InMemoryCache {
    /// Creates a new empty in-memory cache.
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    /// Creates a new in-memory cache with the specified initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: DashMap::with_capacity(capacity),
        }
    }
}

impl InMemoryCache {
    /// Removes the entry under `key` if it is still expired.
    ///
    /// A concurrent writer may have replaced it since it was read; a live
    /// entry is left in place. Returns whether anything was removed.
    fn evict_expired(&self, key: &str) -> bool {
        let evicted = self.store.remove_if(key, |_, v| v.is_expired()).is_some();
        if evicted {
            trace!("evicted expired cache entry {}", key);
        }
        evicted
    }
}

impl CacheProvider for InMemoryCache {
    fn get(&self, key: &str) -> Option<CachedValue> {
        let entry = self.store.get(key)?;
        let value = entry.value();

        if value.is_expired() {
            drop(entry);
            self.evict_expired(key);
            None
        } else {
            Some(value.clone())
        }
    }

    fn set(&self, key: &str, value: CachedValue) {
        self.store.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.store.remove(key);
    }

    fn remove_matching(&self, pattern: &KeyPattern) -> usize {
        let mut removed = 0;
        self.store.retain(|key, _| {
            if pattern.matches(key) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    fn clear(&self) {
        self.store.clear();
    }

    fn gc(&self) -> usize {
        let mut removed = 0;
        self.store.retain(|_, value| {
            if value.is_expired() {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn keys(&self) -> Vec<String> {
        self.store.iter().map(|entry| entry.key().clone()).collect()
    }
}

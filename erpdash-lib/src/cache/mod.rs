//! Generic caching layer
//!
//! Provides a `CacheProvider` trait and an in-memory implementation for
//! caching resource payloads with TTL support, plus the typed [`Cache`]
//! handle the cached accessors share.
//!
//! All operations are synchronous. A read never suspends, so two callers
//! racing on the same key can only interleave between whole operations.

mod config;
mod key;
mod memory;
mod pattern;
mod store;

pub use config::*;
pub use key::*;
pub use memory::*;
pub use pattern::*;
pub use store::*;

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use tokio::time::Instant;

/// Type-erased cached payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// A cached value with metadata about when it was cached and how long it lives.
#[derive(Clone)]
pub struct CachedValue {
    /// The cached data. Shared, never deep-copied on read.
    pub data: Payload,
    /// Wall-clock time the value was cached, for reporting.
    pub created_at: DateTime<Utc>,
    /// Monotonic time the value was cached. Expiry is decided against this.
    pub stored_at: Instant,
    /// How long the value stays valid after `stored_at`.
    pub ttl: Duration,
}

impl CachedValue {
    /// Creates a new cached value stored now with the given TTL.
    pub fn with_ttl(data: Payload, ttl: Duration) -> Self {
        Self {
            data,
            created_at: Utc::now(),
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// Wraps a typed value and stores it now with the given TTL.
    pub fn from_value<T: Any + Send + Sync>(value: T, ttl: Duration) -> Self {
        Self::with_ttl(Arc::new(value), ttl)
    }

    /// Time elapsed since the value was stored.
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    /// Returns `true` once more than `ttl` has elapsed since the value was stored.
    ///
    /// A value whose age equals its TTL exactly is still valid.
    pub fn is_expired(&self) -> bool {
        self.age() > self.ttl
    }

    /// Wall-clock time after which the value is no longer returned.
    ///
    /// Saturates at the latest representable time for TTLs past it.
    pub fn expires_at(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns the payload as `T`, or `None` if it holds another type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.data.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for CachedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedValue")
            .field("created_at", &self.created_at)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Trait for cache providers.
///
/// Implementations store and retrieve cached values by string keys.
/// The provider is responsible for:
/// - Never returning expired values from `get()`
/// - Evicting an expired entry when a read finds it
/// - Providing garbage collection for expired entries
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use erpdash_lib::cache::{CacheProvider, CachedValue, InMemoryCache};
///
/// let cache = InMemoryCache::new();
/// cache.set("my-key", CachedValue::from_value(vec![1, 2, 3], Duration::from_secs(60)));
///
/// let cached = cache.get("my-key").unwrap();
/// assert_eq!(*cached.downcast::<Vec<i32>>().unwrap(), vec![1, 2, 3]);
/// ```
pub trait CacheProvider: Send + Sync {
    /// Retrieves a cached value by key.
    ///
    /// Returns `None` if the key doesn't exist or the value has expired.
    /// An expired value is removed before returning.
    fn get(&self, key: &str) -> Option<CachedValue>;

    /// Stores a value, replacing any existing entry for the key.
    fn set(&self, key: &str, value: CachedValue);

    /// Returns `true` if `get(key)` would return a value.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes a value from the cache.
    fn remove(&self, key: &str);

    /// Removes every value whose key matches the pattern.
    ///
    /// Returns the number of entries removed.
    fn remove_matching(&self, pattern: &KeyPattern) -> usize;

    /// Clears all values from the cache.
    fn clear(&self);

    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    fn gc(&self) -> usize;

    /// Number of stored entries, including expired ones not yet evicted.
    fn len(&self) -> usize;

    /// Returns `true` if no entries are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the stored keys, in no particular order.
    fn keys(&self) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expires_at_adds_ttl() {
        let value = CachedValue::from_value(1u8, Duration::from_secs(300));
        assert_eq!(
            value.expires_at() - value.created_at,
            chrono::Duration::seconds(300)
        );
    }

    #[test]
    fn test_expires_at_saturates_for_huge_ttl() {
        // fits in a TimeDelta but not past the current date
        let value = CachedValue::from_value(1u8, Duration::from_secs(10_000_000_000_000));
        assert_eq!(value.expires_at(), DateTime::<Utc>::MAX_UTC);

        let value = CachedValue::from_value(1u8, Duration::MAX);
        assert_eq!(value.expires_at(), DateTime::<Utc>::MAX_UTC);
        assert!(!value.is_expired());
    }
}

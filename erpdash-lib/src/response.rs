//! Accessor results tagged with their cache provenance

use std::fmt;

use chrono::DateTime;
use chrono::Utc;

/// Data returned by a cached accessor, along with where it came from and how
/// long the stored copy lives.
///
/// A hit may be older than the upstream state: a background refresh is
/// usually already on its way. A miss was fetched by this very call.
///
/// ```ignore
/// let tenants = api.tenants(false).await?;
/// if tenants.is_cached() {
///     log::debug!("tenants from {}", tenants.cached_at());
/// }
/// let tenants = tenants.into_inner();
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    data: T,
    /// Whether the data came out of the cache.
    pub cache: CacheStatus,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl<T> Response<T> {
    /// Freshly fetched data that has just been stored.
    pub fn cache_miss(data: T, cached_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            data,
            cache: CacheStatus::Miss,
            cached_at,
            expires_at,
        }
    }

    /// Data served from an existing entry.
    pub fn cache_hit(data: T, cached_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            data,
            cache: CacheStatus::Hit,
            cached_at,
            expires_at,
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_hit()
    }

    /// When the served copy was stored.
    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    /// When the served copy stops being returned by the cache.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

/// Where a [`Response`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Fetched from the API, either on an empty slot or a forced refresh.
    Miss,
    /// Served from the cache.
    Hit,
}

impl CacheStatus {
    pub fn is_hit(self) -> bool {
        self == Self::Hit
    }

    pub fn is_miss(self) -> bool {
        self == Self::Miss
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => f.write_str("hit"),
            Self::Miss => f.write_str("miss"),
        }
    }
}

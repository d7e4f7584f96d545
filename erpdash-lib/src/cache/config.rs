//! Cache configuration

use std::time::Duration;

/// Which TTL tier a write uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtlTier {
    /// Short-lived entries. Used by every cached accessor.
    #[default]
    Default,
    /// Long-lived entries for data that rarely changes.
    Long,
}

/// Configuration for cache TTL (time-to-live) settings.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use erpdash_lib::cache::CacheConfig;
///
/// let config = CacheConfig::default()
///     .with_default_ttl(Duration::from_secs(60))
///     .with_long_ttl(Duration::from_secs(7200));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for ordinary writes.
    ///
    /// Default: 5 minutes
    pub default_ttl: Duration,

    /// TTL for the long tier.
    ///
    /// Default: 1 hour
    pub long_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300), // 5 minutes
            long_ttl: Duration::from_secs(3600),   // 1 hour
        }
    }
}

impl CacheConfig {
    /// Creates a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets the long TTL.
    pub fn with_long_ttl(mut self, ttl: Duration) -> Self {
        self.long_ttl = ttl;
        self
    }

    /// Returns the TTL for a tier.
    pub fn ttl(&self, tier: TtlTier) -> Duration {
        match tier {
            TtlTier::Default => self.default_ttl,
            TtlTier::Long => self.long_ttl,
        }
    }
}

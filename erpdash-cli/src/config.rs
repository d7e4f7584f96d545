//! Command-line configuration

use std::time::Duration;

use clap::Args;
use erpdash_lib::ErpClient;
use erpdash_lib::auth::StaticTokenProvider;
use erpdash_lib::cache::CacheConfig;
use simplelog::LevelFilter;

/// Connection and cache settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// API base URL
    #[arg(long, env = "ERPDASH_BASE_URL")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[arg(long, env = "ERPDASH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "ERPDASH_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// How long cached results stay fresh, in seconds
    #[arg(long, env = "ERPDASH_CACHE_TTL_SECS", default_value_t = 300)]
    pub cache_ttl_secs: u64,

    /// Log level written to the log file
    #[arg(long, env = "ERPDASH_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,
}

impl Config {
    /// Builds the HTTP client.
    pub fn client(&self) -> anyhow::Result<ErpClient> {
        let mut builder = ErpClient::builder()
            .url(&self.base_url)
            .timeout(Duration::from_secs(self.timeout_secs));
        if let Some(token) = &self.token {
            builder = builder.token_provider(StaticTokenProvider::new(token));
        }
        Ok(builder.build()?)
    }

    /// TTL settings for the shared cache.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::default().with_default_ttl(Duration::from_secs(self.cache_ttl_secs))
    }
}

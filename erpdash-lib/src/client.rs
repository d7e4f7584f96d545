//! Main ErpClient

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::auth::TokenProvider;
use crate::error::ApiError;

/// HTTP client for the ERP transaction API.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across threads safely. It implements [`crate::api::ResourceApi`] and
/// [`crate::api::MutationApi`], so it can be wrapped by a
/// [`crate::CachedApi`].
///
/// # Example
///
/// ```ignore
/// use erpdash_lib::{ErpClient, auth::StaticTokenProvider};
///
/// let client = ErpClient::builder()
///     .url("https://erp.example.com/api")
///     .token_provider(StaticTokenProvider::new("my-token"))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct ErpClient {
    pub(crate) inner: Arc<ErpClientInner>,
}

pub(crate) struct ErpClientInner {
    pub(crate) base_url: Url,
    pub(crate) token_provider: Option<Arc<dyn TokenProvider>>,
    pub(crate) http_client: Client,
    pub(crate) timeout: Option<Duration>,
}

impl ErpClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> ErpClientBuilder<Missing> {
        ErpClientBuilder::new()
    }

    /// Returns the base URL of the API.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }
}

impl std::fmt::Debug for ErpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErpClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.inner.token_provider.is_some())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing an [`ErpClient`].
///
/// Uses the typestate pattern to ensure the base URL is set at compile time.
/// A token provider is optional; without one, requests are sent
/// unauthenticated.
///
/// # Example
///
/// ```ignore
/// let client = ErpClient::builder()
///     .url("https://erp.example.com/api")
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub struct ErpClientBuilder<U> {
    url: U,
    token_provider: Option<Arc<dyn TokenProvider>>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl ErpClientBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            token_provider: None,
            timeout: None,
            connect_timeout: None,
            http_client: None,
        }
    }

    /// Sets the API base URL.
    ///
    /// Resource paths are appended to it, so
    /// `https://erp.example.com/api` yields `https://erp.example.com/api/tenants`.
    pub fn url(self, url: impl Into<String>) -> ErpClientBuilder<Set<String>> {
        ErpClientBuilder {
            url: Set(url.into()),
            token_provider: self.token_provider,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl Default for ErpClientBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> ErpClientBuilder<U> {
    /// Sets the token provider for authentication.
    pub fn token_provider<T: TokenProvider + 'static>(mut self, provider: T) -> Self {
        self.token_provider = Some(Arc::new(provider));
        self
    }

    /// Sets a shared token provider.
    pub fn shared_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl ErpClientBuilder<Set<String>> {
    /// Builds the [`ErpClient`].
    ///
    /// Fails if the URL does not parse or cannot carry a path.
    pub fn build(self) -> Result<ErpClient, ApiError> {
        let raw = self.url.0;
        let base_url =
            Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(raw));
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(ErpClient {
            inner: Arc::new(ErpClientInner {
                base_url,
                token_provider: self.token_provider,
                http_client,
                timeout: self.timeout,
            }),
        })
    }
}

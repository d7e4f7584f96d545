//! Error types

mod api;
mod auth;

pub use api::*;
pub use auth::*;

use crate::api::Resource;

/// Top-level error for client and cached accessor operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// No usable access token.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A cached accessor had to hit the network and the fetch failed.
    #[error("failed to fetch {resource}: {source}")]
    Fetch {
        /// The resource being fetched.
        resource: Resource,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps a foreground fetch failure of a cached accessor.
    pub fn fetch(resource: Resource, source: impl Into<Error>) -> Self {
        Self::Fetch {
            resource,
            source: Box::new(source.into()),
        }
    }

    /// Returns the HTTP status code of the underlying API error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(err) => err.status_code(),
            Self::Auth(_) => None,
            Self::Fetch { source, .. } => source.status_code(),
        }
    }

    /// Returns the root cause, unwrapping fetch wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Self::Fetch { source, .. } => source.root(),
            other => other,
        }
    }
}

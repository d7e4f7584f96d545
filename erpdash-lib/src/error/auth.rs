//! Authentication error types

/// Errors that can occur while obtaining an access token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token has expired and cannot be renewed by this provider.
    #[error("Token expired: {message}")]
    TokenExpired { message: String },

    /// The provider has no token to hand out.
    #[error("No access token available")]
    MissingToken,
}

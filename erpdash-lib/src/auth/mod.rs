//! Authentication
//!
//! The client only forwards a bearer token. Acquiring and refreshing it is
//! the embedding application's job, behind the [`TokenProvider`] trait.

mod token;

pub use token::AccessToken;
pub use token::StaticTokenProvider;
pub use token::TokenProvider;

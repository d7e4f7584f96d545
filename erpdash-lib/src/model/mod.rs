//! Typed models
//!
//! Records for every resource the API serves. Fields the client does not
//! interpret are kept in each record's `extra` map so they survive a
//! read-modify-write round trip.

mod application;
mod schema;
mod tenant;
mod transaction;

pub use application::*;
pub use schema::*;
pub use tenant::*;
pub use transaction::*;

use serde::Deserialize;
use serde::Deserializer;

/// Fields not modeled explicitly.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Deserializes an identifier sent either as a string or as a number.
pub(crate) fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Uint(n) => n.to_string(),
    })
}

/// Like [`id_from_any`], for optional identifiers.
pub(crate) fn opt_id_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "id_from_any")] String);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(id)| id))
}

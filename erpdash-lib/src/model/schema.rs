//! Model schemas

use serde::Deserialize;
use serde::Serialize;

use super::Extra;

/// State value marking a soft-deleted schema.
pub const SCHEMA_STATE_DELETED: &str = "deleted";

/// A data model schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSchema {
    #[serde(default, deserialize_with = "super::id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ModelSchema {
    /// Creates a schema with an id and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the state.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Returns `true` if the schema was soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.state.as_deref() == Some(SCHEMA_STATE_DELETED)
    }
}

/// Drops soft-deleted schemas.
pub fn without_deleted(schemas: Vec<ModelSchema>) -> Vec<ModelSchema> {
    schemas.into_iter().filter(|s| !s.is_deleted()).collect()
}

use quill_update::{FieldPath, UpdateConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Limits for every update applied through the database.
    pub update: UpdateConfig,
}

impl DatabaseConfig {
    /// Read overrides from `QUILL_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            update: UpdateConfig::from_env(),
        }
    }
}

/// A collection and the field paths it keeps secondary indexes on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    #[serde(default)]
    pub indexes: Vec<FieldPath>,
}

use serde::{Deserialize, Serialize};

/// Limits applied while preparing and applying an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Largest encoded size, in bytes, an updated document may reach.
    pub max_document_size: usize,
    /// Deepest field path an update may name.
    pub max_path_depth: usize,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            max_document_size: 16 * 1024 * 1024,
            max_path_depth: quill_path::DEFAULT_MAX_DEPTH,
        }
    }
}

impl UpdateConfig {
    /// Defaults overridden by `QUILL_MAX_DOCUMENT_SIZE` and `QUILL_MAX_PATH_DEPTH`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_document_size: env_or("QUILL_MAX_DOCUMENT_SIZE", defaults.max_document_size),
            max_path_depth: env_or("QUILL_MAX_PATH_DEPTH", defaults.max_path_depth),
        }
    }
}

fn env_or(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

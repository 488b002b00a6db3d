use std::fmt;

use quill_path::{FieldPath, PathConflict, PathError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable classification of an [`UpdateError`], suitable for a last-error reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidPath,
    ConflictingPaths,
    PathTypeConflict,
    TypeMismatch,
    ImmutableField,
    InvalidUpdate,
    DocumentTooLarge,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidPath => "invalid_path",
            Self::ConflictingPaths => "conflicting_paths",
            Self::PathTypeConflict => "path_type_conflict",
            Self::TypeMismatch => "type_mismatch",
            Self::ImmutableField => "immutable_field",
            Self::InvalidUpdate => "invalid_update",
            Self::DocumentTooLarge => "document_too_large",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),
    #[error("conflicting paths: {0}")]
    ConflictingPaths(#[from] PathConflict),
    #[error("cannot update '{path}': {reason}")]
    PathTypeConflict { path: FieldPath, reason: String },
    #[error("cannot apply {operator} to '{path}': existing value is {found}")]
    TypeMismatch {
        operator: &'static str,
        path: FieldPath,
        found: &'static str,
    },
    #[error("the field '{path}' is immutable")]
    ImmutableField { path: FieldPath },
    #[error("invalid update: {0}")]
    InvalidUpdate(String),
    #[error("updated document is {size} bytes, larger than the {max} byte limit")]
    DocumentTooLarge { size: usize, max: usize },
    #[error("bson: {0}")]
    Bson(String),
}

impl UpdateError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidPath(_) => ErrorCode::InvalidPath,
            Self::ConflictingPaths(_) => ErrorCode::ConflictingPaths,
            Self::PathTypeConflict { .. } => ErrorCode::PathTypeConflict,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::ImmutableField { .. } => ErrorCode::ImmutableField,
            Self::InvalidUpdate(_) => ErrorCode::InvalidUpdate,
            Self::DocumentTooLarge { .. } => ErrorCode::DocumentTooLarge,
            Self::Bson(_) => ErrorCode::Internal,
        }
    }
}

use std::fmt;

use quill_update::{ErrorCode, FieldPath, UpdateError};
use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Update(#[from] UpdateError),
    #[error("collection not found: {0}")]
    CollectionNotFound(String),
    #[error("collection already exists: {0}")]
    CollectionExists(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("document has no _id field")]
    MissingId,
    #[error("collection {collection} has no index on '{path}'")]
    IndexNotFound { collection: String, path: FieldPath },
    #[error("collection {collection} already has an index on '{path}'")]
    IndexExists { collection: String, path: FieldPath },
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Classification of a [`DbError`] as reported in a [`crate::LastError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbErrorCode {
    Update(ErrorCode),
    CollectionNotFound,
    CollectionExists,
    DuplicateKey,
    MissingId,
    IndexNotFound,
    IndexExists,
    Internal,
}

impl DbErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Update(code) => code.as_str(),
            Self::CollectionNotFound => "collection_not_found",
            Self::CollectionExists => "collection_exists",
            Self::DuplicateKey => "duplicate_key",
            Self::MissingId => "missing_id",
            Self::IndexNotFound => "index_not_found",
            Self::IndexExists => "index_exists",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for DbErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DbErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl DbError {
    pub fn code(&self) -> DbErrorCode {
        match self {
            Self::Update(e) => DbErrorCode::Update(e.code()),
            Self::CollectionNotFound(_) => DbErrorCode::CollectionNotFound,
            Self::CollectionExists(_) => DbErrorCode::CollectionExists,
            Self::DuplicateKey(_) => DbErrorCode::DuplicateKey,
            Self::MissingId => DbErrorCode::MissingId,
            Self::IndexNotFound { .. } => DbErrorCode::IndexNotFound,
            Self::IndexExists { .. } => DbErrorCode::IndexExists,
            Self::LockPoisoned(_) => DbErrorCode::Internal,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned(e.to_string())
    }
}

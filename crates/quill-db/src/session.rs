use std::sync::Arc;

use bson::Document;
use serde::Serialize;
use tracing::warn;

use crate::database::{Database, Selector, UpdateOptions};
use crate::error::{DbError, DbErrorCode};

/// Status of the writes issued through a [`Session`].
///
/// A failed write records its error here instead of returning it. The error
/// stays until [`Session::reset_error`], even if later writes succeed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LastError {
    pub err: Option<String>,
    pub code: Option<DbErrorCode>,
    /// Documents affected by the most recent successful write.
    pub n: u64,
    /// Whether the most recent successful update matched an existing document.
    pub updated_existing: bool,
}

impl LastError {
    pub fn is_error(&self) -> bool {
        self.err.is_some()
    }
}

/// One client's view of a shared [`Database`].
pub struct Session {
    db: Arc<Database>,
    last_error: LastError,
}

impl Session {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            last_error: LastError::default(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn insert(&mut self, collection: &str, doc: Document) {
        let result = self.db.insert_one(collection, doc);
        self.record(collection, "insert", result.map(|()| (1, false)));
    }

    pub fn update(
        &mut self,
        collection: &str,
        selector: &Selector,
        update: &Document,
        options: UpdateOptions,
    ) {
        let result = self
            .db
            .update(collection, selector, update, options)
            .map(|r| (r.matched, r.matched > 0));
        self.record(collection, "update", result);
    }

    pub fn get_last_error(&self) -> &LastError {
        &self.last_error
    }

    pub fn reset_error(&mut self) {
        self.last_error = LastError::default();
    }

    fn record(&mut self, collection: &str, op: &str, result: Result<(u64, bool), DbError>) {
        match result {
            Ok((n, updated_existing)) => {
                self.last_error.n = n;
                self.last_error.updated_existing = updated_existing;
            }
            Err(e) => {
                warn!(collection, op, error = %e, "write failed");
                self.last_error = LastError {
                    err: Some(e.to_string()),
                    code: Some(e.code()),
                    n: 0,
                    updated_existing: false,
                };
            }
        }
    }
}

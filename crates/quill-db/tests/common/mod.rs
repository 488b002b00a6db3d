#![allow(dead_code)]

use std::sync::Arc;

use bson::{Bson, Document};
use quill_db::{CollectionConfig, Database, DatabaseConfig, FieldPath, Session};

pub const COLLECTION: &str = "accounts";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn path(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

/// A database holding one empty collection indexed on `indexes`.
pub fn db_with_indexes(indexes: &[&str]) -> Arc<Database> {
    init_tracing();
    let db = Database::open(DatabaseConfig::default());
    db.create_collection(&CollectionConfig {
        name: COLLECTION.to_string(),
        indexes: indexes.iter().map(|p| path(p)).collect(),
    })
    .unwrap();
    Arc::new(db)
}

pub fn session(db: &Arc<Database>) -> Session {
    Session::new(Arc::clone(db))
}

/// Documents found through the index on `field`.
pub fn by_index(db: &Database, field: &str, value: impl Into<Bson>) -> Vec<Document> {
    db.find_by_index(COLLECTION, &path(field), &value.into())
        .unwrap()
}

pub fn keys(doc: &Document) -> Vec<&str> {
    doc.keys().map(String::as_str).collect()
}

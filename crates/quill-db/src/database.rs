use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use arc_swap::ArcSwap;
use bson::{Bson, Document};
use quill_update::{FieldPath, prepare_update};
use serde::Serialize;
use tracing::{debug, info};

use crate::collection::{CollectionState, DocUpdate};
use crate::config::{CollectionConfig, DatabaseConfig};
use crate::error::DbError;
use crate::index::IndexKey;

/// Which documents an update applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Every document, in `_id` order.
    All,
    /// The document with this `_id`.
    Id(Bson),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Update every selected document instead of the first.
    pub multi: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
}

type Handle = Arc<ArcSwap<CollectionState>>;

/// In-memory document database.
///
/// Reads load the current snapshot of a collection without locking. Writes
/// serialize on one lock, build the next snapshot and publish it only if
/// every step succeeded.
pub struct Database {
    collections: RwLock<HashMap<String, Handle>>,
    write_lock: Mutex<()>,
    config: DatabaseConfig,
}

impl Database {
    pub fn open(config: DatabaseConfig) -> Self {
        debug!(?config, "opening database");
        Self {
            collections: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn create_collection(&self, config: &CollectionConfig) -> Result<(), DbError> {
        let _guard = self.write_lock.lock()?;
        let mut collections = self.collections.write()?;
        if collections.contains_key(&config.name) {
            return Err(DbError::CollectionExists(config.name.clone()));
        }

        let mut state = CollectionState::default();
        for path in &config.indexes {
            if !state.add_index(path.clone()) {
                return Err(DbError::IndexExists {
                    collection: config.name.clone(),
                    path: path.clone(),
                });
            }
        }
        collections.insert(config.name.clone(), Arc::new(ArcSwap::from_pointee(state)));
        info!(collection = %config.name, indexes = config.indexes.len(), "created collection");
        Ok(())
    }

    pub fn list_collections(&self) -> Result<Vec<String>, DbError> {
        let mut names: Vec<String> = self.collections.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Add an index to an existing collection, covering the documents it
    /// already holds.
    pub fn create_index(&self, collection: &str, path: FieldPath) -> Result<(), DbError> {
        let _guard = self.write_lock.lock()?;
        let handle = self.handle(collection)?;
        let mut state = CollectionState::clone(&handle.load());
        if !state.add_index(path.clone()) {
            return Err(DbError::IndexExists {
                collection: collection.to_string(),
                path,
            });
        }
        handle.store(Arc::new(state));
        info!(collection, %path, "created index");
        Ok(())
    }

    pub fn insert_one(&self, collection: &str, doc: Document) -> Result<(), DbError> {
        let _guard = self.write_lock.lock()?;
        let handle = self.handle(collection)?;
        let mut state = CollectionState::clone(&handle.load());
        let id = doc.get("_id").cloned();
        if !state.insert(doc)? {
            let id = id.map(|id| id.to_string()).unwrap_or_default();
            return Err(DbError::DuplicateKey(id));
        }
        handle.store(Arc::new(state));
        Ok(())
    }

    pub fn find_by_id(&self, collection: &str, id: &Bson) -> Result<Option<Document>, DbError> {
        let state = self.handle(collection)?.load_full();
        Ok(state.get(id).cloned())
    }

    /// Every document in `_id` order.
    pub fn find_all(&self, collection: &str) -> Result<Vec<Document>, DbError> {
        let state = self.handle(collection)?.load_full();
        Ok(state.documents().cloned().collect())
    }

    /// Documents whose `path` holds `value`, answered from the index on
    /// `path`. A `null` value also finds documents where the field is missing.
    pub fn find_by_index(
        &self,
        collection: &str,
        path: &FieldPath,
        value: &Bson,
    ) -> Result<Vec<Document>, DbError> {
        let state = self.handle(collection)?.load_full();
        let index = state.index(path).ok_or_else(|| DbError::IndexNotFound {
            collection: collection.to_string(),
            path: path.clone(),
        })?;
        let ids = index.lookup(&IndexKey::from_bson(value));
        Ok(ids
            .iter()
            .filter_map(|id| state.get_record(id))
            .cloned()
            .collect())
    }

    pub fn count(&self, collection: &str) -> Result<usize, DbError> {
        Ok(self.handle(collection)?.load().len())
    }

    /// Apply `update` to the selected documents.
    ///
    /// The update is parsed and checked once, before any document is read.
    /// If it fails on any document, none of the selected documents change.
    pub fn update(
        &self,
        collection: &str,
        selector: &Selector,
        update: &Document,
        options: UpdateOptions,
    ) -> Result<UpdateResult, DbError> {
        let prepared = prepare_update(update, &self.config.update)?;

        let _guard = self.write_lock.lock()?;
        let handle = self.handle(collection)?;
        let mut state = CollectionState::clone(&handle.load());

        let mut targets = match selector {
            Selector::All => state.ids(),
            Selector::Id(id) => vec![IndexKey::from_bson(id)],
        };
        if !options.multi {
            targets.truncate(1);
        }

        let mut result = UpdateResult::default();
        for id in &targets {
            match state.update(id, &prepared)? {
                DocUpdate::Missing => {}
                DocUpdate::Unchanged => result.matched += 1,
                DocUpdate::Modified => {
                    result.matched += 1;
                    result.modified += 1;
                }
            }
        }

        if result.modified > 0 {
            handle.store(Arc::new(state));
        }
        debug!(
            collection,
            matched = result.matched,
            modified = result.modified,
            "update applied"
        );
        Ok(result)
    }

    fn handle(&self, collection: &str) -> Result<Handle, DbError> {
        self.collections
            .read()?
            .get(collection)
            .cloned()
            .ok_or_else(|| DbError::CollectionNotFound(collection.to_string()))
    }
}

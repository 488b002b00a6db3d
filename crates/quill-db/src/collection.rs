use bson::{Bson, Document};
use imbl::OrdMap;
use quill_update::{FieldPath, PreparedUpdate};

use crate::error::DbError;
use crate::index::{FieldIndex, IndexKey, RecordId, RecordIndexes};

/// Immutable snapshot of one collection.
///
/// Writers clone the snapshot, mutate the clone and publish it; readers keep
/// whatever snapshot they loaded. Cloning is cheap because both maps share
/// structure with their source.
#[derive(Debug, Clone, Default)]
pub(crate) struct CollectionState {
    records: OrdMap<RecordId, Document>,
    indexes: Vec<FieldIndex>,
}

/// Result of running an update against one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DocUpdate {
    Missing,
    Unchanged,
    Modified,
}

fn record_id(doc: &Document) -> Result<RecordId, DbError> {
    doc.get("_id").map(IndexKey::from_bson).ok_or(DbError::MissingId)
}

impl CollectionState {
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn get(&self, id: &Bson) -> Option<&Document> {
        self.get_record(&IndexKey::from_bson(id))
    }

    pub(crate) fn get_record(&self, id: &RecordId) -> Option<&Document> {
        self.records.get(id)
    }

    pub(crate) fn documents(&self) -> impl Iterator<Item = &Document> {
        self.records.values()
    }

    pub(crate) fn ids(&self) -> Vec<RecordId> {
        self.records.keys().cloned().collect()
    }

    pub(crate) fn index(&self, path: &FieldPath) -> Option<&FieldIndex> {
        self.indexes.iter().find(|index| index.path() == path)
    }

    /// Build an index over every stored document. Returns false if one
    /// already exists on `path`.
    pub(crate) fn add_index(&mut self, path: FieldPath) -> bool {
        if self.index(&path).is_some() {
            return false;
        }
        let mut index = FieldIndex::new(path);
        for (id, doc) in self.records.iter() {
            index.sync(id, doc);
        }
        self.indexes.push(index);
        true
    }

    /// Store a new document. Returns false if its `_id` is taken.
    pub(crate) fn insert(&mut self, doc: Document) -> Result<bool, DbError> {
        let id = record_id(&doc)?;
        if self.records.contains_key(&id) {
            return Ok(false);
        }
        for index in &mut self.indexes {
            index.sync(&id, &doc);
        }
        self.records.insert(id, doc);
        Ok(true)
    }

    /// Apply `update` to the document stored under `id`, keeping every
    /// index current.
    pub(crate) fn update(
        &mut self,
        id: &RecordId,
        update: &PreparedUpdate,
    ) -> Result<DocUpdate, DbError> {
        let Some(mut doc) = self.records.get(id).cloned() else {
            return Ok(DocUpdate::Missing);
        };
        let mut hook = RecordIndexes {
            id,
            indexes: &mut self.indexes,
        };
        let outcome = update.apply(&mut doc, &mut hook)?;
        if !outcome.modified {
            return Ok(DocUpdate::Unchanged);
        }
        self.records.insert(id.clone(), doc);
        Ok(DocUpdate::Modified)
    }
}

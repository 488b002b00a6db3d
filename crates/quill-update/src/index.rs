use bson::Document;
use quill_path::FieldPath;

/// Keeps secondary indexes in step with documents changed by an update.
///
/// Called after the updated document has replaced the original, once per
/// effective modifier whose path overlaps (equals, contains or lies under) a
/// path the implementation reports as covered.
pub trait IndexHook {
    /// Whether some index key is derived from `path` or from a field above or below it.
    fn covers(&self, path: &FieldPath) -> bool;

    /// `doc` is the document after the rename of `old` to `new`.
    fn on_field_renamed(&mut self, doc: &Document, old: &FieldPath, new: &FieldPath);

    /// `doc` is the document after `path` was written or removed.
    fn on_field_modified(&mut self, _doc: &Document, _path: &FieldPath) {}
}

/// Hook for documents without secondary indexes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIndexes;

impl IndexHook for NoIndexes {
    fn covers(&self, _path: &FieldPath) -> bool {
        false
    }

    fn on_field_renamed(&mut self, _doc: &Document, _old: &FieldPath, _new: &FieldPath) {}
}

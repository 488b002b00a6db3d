use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use bson::{Bson, Document, RawDocumentBuf};
use imbl::{OrdMap, OrdSet};
use quill_update::{FieldPath, IndexHook};
use tracing::{trace, warn};

/// Totally ordered, hashable form of a BSON value.
///
/// Numbers of every width compare by value, so `1`, `1i64` and `1.0` are the
/// same key while distinct 64-bit integers stay distinct. Values without a
/// dedicated variant compare by their encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    Null,
    Number(NumberKey),
    String(String),
    Bool(bool),
    Encoded(Vec<u8>),
    /// A value that could not be encoded, keyed by its display form.
    Unencodable(String),
}

/// A number in canonical form.
///
/// Every integral value that fits an `i64` is held as `Int`, whatever its
/// BSON type; `Double` only holds fractions, infinities, NaN and magnitudes
/// beyond `i64`. Ordering is exact across both, with NaN below every number.
#[derive(Debug, Clone, Copy)]
pub enum NumberKey {
    Int(i64),
    Double(f64),
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

impl NumberKey {
    fn from_f64(value: f64) -> Self {
        if value.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&value) {
            Self::Int(value as i64)
        } else if value.is_nan() {
            Self::Double(f64::NAN)
        } else {
            Self::Double(value)
        }
    }
}

/// Order of an integer against a double that is never integral in `i64` range.
fn cmp_int_double(int: i64, double: f64) -> Ordering {
    if double.is_nan() {
        Ordering::Greater
    } else if double >= TWO_POW_63 {
        Ordering::Less
    } else if double < -TWO_POW_63 {
        Ordering::Greater
    } else if int <= double.floor() as i64 {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

impl Ord for NumberKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(&b),
            (Self::Int(a), Self::Double(b)) => cmp_int_double(a, b),
            (Self::Double(a), Self::Int(b)) => cmp_int_double(b, a).reverse(),
            (Self::Double(a), Self::Double(b)) => match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            },
        }
    }
}

impl PartialOrd for NumberKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NumberKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NumberKey {}

impl Hash for NumberKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match *self {
            Self::Int(n) => {
                state.write_u8(0);
                n.hash(state);
            }
            Self::Double(d) => {
                state.write_u8(1);
                d.to_bits().hash(state);
            }
        }
    }
}

impl IndexKey {
    pub fn from_bson(value: &Bson) -> Self {
        match value {
            Bson::Null | Bson::Undefined => Self::Null,
            Bson::Int32(n) => Self::Number(NumberKey::Int(i64::from(*n))),
            Bson::Int64(n) => Self::Number(NumberKey::Int(*n)),
            Bson::Double(n) => Self::Number(NumberKey::from_f64(*n)),
            Bson::String(s) => Self::String(s.clone()),
            Bson::Boolean(b) => Self::Bool(*b),
            other => encode(other),
        }
    }
}

fn encode(value: &Bson) -> IndexKey {
    let mut wrapper = Document::new();
    wrapper.insert("", value.clone());
    match RawDocumentBuf::try_from(&wrapper) {
        Ok(raw) => IndexKey::Encoded(raw.as_bytes().to_vec()),
        Err(e) => {
            warn!(error = %e, "value cannot be encoded, keying by its display form");
            IndexKey::Unencodable(value.to_string())
        }
    }
}

/// Identity of a stored document: its `_id` as a key.
pub(crate) type RecordId = IndexKey;

/// Every key `path` yields for `doc`.
///
/// A leaf array contributes each element, and arrays met along the way fan
/// out over their subdocuments. A document that yields nothing is keyed
/// under `null`, so a missing field can be looked up like an explicit one.
pub(crate) fn extract_keys(doc: &Document, path: &FieldPath) -> Vec<IndexKey> {
    let mut keys = Vec::new();
    collect_from_doc(doc, path.parts(), &mut keys);
    keys.sort();
    keys.dedup();
    if keys.is_empty() {
        keys.push(IndexKey::Null);
    }
    keys
}

fn collect_from_doc(doc: &Document, parts: &[String], out: &mut Vec<IndexKey>) {
    let Some((first, rest)) = parts.split_first() else {
        return;
    };
    if let Some(value) = doc.get(first) {
        collect_from_value(value, rest, out);
    }
}

fn collect_from_value(value: &Bson, rest: &[String], out: &mut Vec<IndexKey>) {
    if rest.is_empty() {
        match value {
            Bson::Array(items) if !items.is_empty() => {
                out.extend(items.iter().map(IndexKey::from_bson));
            }
            other => out.push(IndexKey::from_bson(other)),
        }
        return;
    }
    match value {
        Bson::Document(sub) => collect_from_doc(sub, rest, out),
        Bson::Array(items) => {
            for item in items {
                if let Bson::Document(sub) = item {
                    collect_from_doc(sub, rest, out);
                }
            }
        }
        _ => {}
    }
}

/// Secondary index on one field path.
///
/// `entries` maps each key to the documents holding it; `reverse` remembers
/// the keys last written for each document so a resync only touches the
/// difference.
#[derive(Debug, Clone)]
pub struct FieldIndex {
    path: FieldPath,
    entries: OrdMap<IndexKey, OrdSet<RecordId>>,
    reverse: OrdMap<RecordId, Vec<IndexKey>>,
}

impl FieldIndex {
    pub fn new(path: FieldPath) -> Self {
        Self {
            path,
            entries: OrdMap::new(),
            reverse: OrdMap::new(),
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Ids of the documents indexed under `key`, in id order.
    pub fn lookup(&self, key: &IndexKey) -> Vec<IndexKey> {
        self.entries
            .get(key)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Bring the entries for `id` in line with `doc`.
    pub(crate) fn sync(&mut self, id: &RecordId, doc: &Document) {
        let new_keys = extract_keys(doc, &self.path);
        let old_keys = self.reverse.get(id).cloned().unwrap_or_default();

        for key in old_keys.iter().filter(|k| !new_keys.contains(k)) {
            self.unlink(key, id);
        }
        for key in new_keys.iter().filter(|k| !old_keys.contains(k)) {
            self.link(key.clone(), id);
        }
        trace!(
            path = %self.path,
            added = new_keys.iter().filter(|k| !old_keys.contains(k)).count(),
            removed = old_keys.iter().filter(|k| !new_keys.contains(k)).count(),
            "index synced"
        );
        self.reverse.insert(id.clone(), new_keys);
    }

    fn link(&mut self, key: IndexKey, id: &RecordId) {
        let mut ids = self.entries.get(&key).cloned().unwrap_or_default();
        ids.insert(id.clone());
        self.entries.insert(key, ids);
    }

    fn unlink(&mut self, key: &IndexKey, id: &RecordId) {
        let now_empty = match self.entries.get_mut(key) {
            Some(ids) => {
                ids.remove(id);
                ids.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.entries.remove(key);
        }
    }
}

/// The indexes of one collection, scoped to the document being updated.
pub(crate) struct RecordIndexes<'a> {
    pub(crate) id: &'a RecordId,
    pub(crate) indexes: &'a mut [FieldIndex],
}

impl RecordIndexes<'_> {
    fn sync_overlapping(&mut self, doc: &Document, paths: &[&FieldPath]) {
        for index in self.indexes.iter_mut() {
            if paths.iter().any(|p| p.conflicts_with(index.path())) {
                index.sync(self.id, doc);
            }
        }
    }
}

impl IndexHook for RecordIndexes<'_> {
    fn covers(&self, path: &FieldPath) -> bool {
        self.indexes.iter().any(|index| index.path().conflicts_with(path))
    }

    fn on_field_renamed(&mut self, doc: &Document, old: &FieldPath, new: &FieldPath) {
        self.sync_overlapping(doc, &[old, new]);
    }

    fn on_field_modified(&mut self, doc: &Document, path: &FieldPath) {
        self.sync_overlapping(doc, &[path]);
    }
}

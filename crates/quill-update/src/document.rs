//! Path navigation over `bson::Document` trees.
//!
//! Every function walks the parsed segments of a [`FieldPath`]. Objects are
//! traversed by key; arrays only by a canonical numeric segment, and only when
//! the caller allows it. Reaching a scalar, or an array that may not be
//! traversed, before the last segment is a [`UpdateError::PathTypeConflict`].

use bson::{Bson, Document};
use quill_path::{FieldPath, array_index};

use crate::error::UpdateError;

/// Most `null` elements a write past the end of an array may add.
pub const MAX_ARRAY_PADDING: usize = 1_500_000;

/// Whether a numeric segment may step into an array element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayTraversal {
    ByIndex,
    Forbidden,
}

/// Look up the value at `path`.
///
/// Returns `Ok(None)` when the path, or any of its ancestors, is missing.
pub fn get<'a>(
    doc: &'a Document,
    path: &FieldPath,
    arrays: ArrayTraversal,
) -> Result<Option<&'a Bson>, UpdateError> {
    let parts = path.parts();
    let Some(mut current) = doc.get(&parts[0]) else {
        return Ok(None);
    };

    for (depth, part) in parts.iter().enumerate().skip(1) {
        let next = match current {
            Bson::Document(sub) => sub.get(part),
            Bson::Array(items) if arrays == ArrayTraversal::ByIndex => match array_index(part) {
                Some(index) => items.get(index),
                None => return Err(blocked(path, depth, "an array")),
            },
            other => return Err(blocked(path, depth, type_name(other))),
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}

/// Check that `path` could be written without crossing a node that cannot
/// hold children. Missing ancestors are fine, they would be created.
pub fn check_route(
    doc: &Document,
    path: &FieldPath,
    arrays: ArrayTraversal,
) -> Result<(), UpdateError> {
    get(doc, path, arrays).map(|_| ())
}

/// Remove and return the value at `path`.
///
/// The parent container stays in place even if it ends up empty. An array
/// element is replaced with `null` so the array keeps its length.
pub fn remove(
    doc: &mut Document,
    path: &FieldPath,
    arrays: ArrayTraversal,
) -> Result<Option<Bson>, UpdateError> {
    remove_in_doc(doc, path, 0, arrays)
}

fn remove_in_doc(
    doc: &mut Document,
    path: &FieldPath,
    depth: usize,
    arrays: ArrayTraversal,
) -> Result<Option<Bson>, UpdateError> {
    let part = &path.parts()[depth];
    if depth + 1 == path.len() {
        return Ok(doc.remove(part));
    }
    match doc.get_mut(part) {
        Some(child) => remove_in_value(child, path, depth + 1, arrays),
        None => Ok(None),
    }
}

fn remove_in_value(
    container: &mut Bson,
    path: &FieldPath,
    depth: usize,
    arrays: ArrayTraversal,
) -> Result<Option<Bson>, UpdateError> {
    match container {
        Bson::Document(sub) => remove_in_doc(sub, path, depth, arrays),
        Bson::Array(items) if arrays == ArrayTraversal::ByIndex => {
            let Some(index) = array_index(&path.parts()[depth]) else {
                return Err(blocked(path, depth, "an array"));
            };
            let Some(element) = items.get_mut(index) else {
                return Ok(None);
            };
            if depth + 1 == path.len() {
                return Ok(Some(std::mem::replace(element, Bson::Null)));
            }
            remove_in_value(element, path, depth + 1, arrays)
        }
        other => Err(blocked(path, depth, type_name(other))),
    }
}

/// Write `value` at `path`, creating missing intermediate objects.
///
/// An existing key keeps its position; a new key is appended to its parent.
/// Returns `false` when the stored value was already equal to `value`.
pub fn set(
    doc: &mut Document,
    path: &FieldPath,
    value: Bson,
    arrays: ArrayTraversal,
) -> Result<bool, UpdateError> {
    set_in_doc(doc, path, 0, value, arrays)
}

fn set_in_doc(
    doc: &mut Document,
    path: &FieldPath,
    depth: usize,
    value: Bson,
    arrays: ArrayTraversal,
) -> Result<bool, UpdateError> {
    let part = &path.parts()[depth];
    if depth + 1 == path.len() {
        if doc.get(part) == Some(&value) {
            return Ok(false);
        }
        doc.insert(part.clone(), value);
        return Ok(true);
    }

    let child = doc
        .entry(part.clone())
        .or_insert_with(|| Bson::Document(Document::new()));
    set_in_value(child, path, depth + 1, value, arrays)
}

fn set_in_value(
    container: &mut Bson,
    path: &FieldPath,
    depth: usize,
    value: Bson,
    arrays: ArrayTraversal,
) -> Result<bool, UpdateError> {
    match container {
        Bson::Document(sub) => set_in_doc(sub, path, depth, value, arrays),
        Bson::Array(items) if arrays == ArrayTraversal::ByIndex => {
            let Some(index) = array_index(&path.parts()[depth]) else {
                return Err(blocked(path, depth, "an array"));
            };
            let last = depth + 1 == path.len();

            if index >= items.len() {
                let padding = index - items.len();
                if padding > MAX_ARRAY_PADDING {
                    return Err(UpdateError::InvalidUpdate(format!(
                        "cannot pad '{}' with {padding} null elements, the limit is {MAX_ARRAY_PADDING}",
                        path.parts()[..depth].join("."),
                    )));
                }
                items.resize(index, Bson::Null);
                if last {
                    items.push(value);
                    return Ok(true);
                }
                items.push(Bson::Document(Document::new()));
            }

            if last {
                if items[index] == value {
                    return Ok(false);
                }
                items[index] = value;
                return Ok(true);
            }
            set_in_value(&mut items[index], path, depth + 1, value, arrays)
        }
        other => Err(blocked(path, depth, type_name(other))),
    }
}

pub(crate) fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Document(_) => "an object",
        Bson::Array(_) => "an array",
        Bson::Null | Bson::Undefined => "null",
        Bson::Boolean(_) => "a boolean",
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => "a number",
        Bson::String(_) | Bson::Symbol(_) => "a string",
        _ => "a scalar",
    }
}

/// `path.parts()[depth]` cannot be used to step into a node of kind `found`.
fn blocked(path: &FieldPath, depth: usize, found: &str) -> UpdateError {
    let parts = path.parts();
    UpdateError::PathTypeConflict {
        path: path.clone(),
        reason: format!(
            "cannot use the part '{}' to traverse '{}', which is {found}",
            parts[depth],
            parts[..depth].join("."),
        ),
    }
}

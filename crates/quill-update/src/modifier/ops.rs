use bson::{Bson, Document};
use quill_path::FieldPath;

use crate::document::{self, ArrayTraversal};
use crate::error::UpdateError;

/// `$set`: write the value, creating missing parents.
pub(crate) fn op_set(doc: &mut Document, path: &FieldPath, value: &Bson) -> Result<bool, UpdateError> {
    document::set(doc, path, value.clone(), ArrayTraversal::ByIndex)
}

/// `$unset`: remove the field. Paths that run into a scalar or a missing
/// parent simply have nothing to remove.
pub(crate) fn op_unset(doc: &mut Document, path: &FieldPath) -> Result<bool, UpdateError> {
    match document::remove(doc, path, ArrayTraversal::ByIndex) {
        Ok(removed) => Ok(removed.is_some()),
        Err(UpdateError::PathTypeConflict { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// `$inc`: add a numeric amount.
///
/// Type promotion rules:
/// - i32 + i32 → i32 (unless overflow, then i64)
/// - i32 + i64 → i64
/// - i64 + i64 → i64 (wrapping is rejected)
/// - any + f64 → f64
/// - missing field treated as 0 with the same type as the increment value
pub(crate) fn op_inc(doc: &mut Document, path: &FieldPath, amount: &Bson) -> Result<bool, UpdateError> {
    let current = document::get(doc, path, ArrayTraversal::ByIndex)?;
    let result = match (current, amount) {
        (None, amount) => amount.clone(),
        (Some(Bson::Int32(a)), Bson::Int32(b)) => match a.checked_add(*b) {
            Some(sum) => Bson::Int32(sum),
            None => Bson::Int64(*a as i64 + *b as i64),
        },
        (Some(Bson::Int32(a)), Bson::Int64(b)) => checked_i64(path, *a as i64, *b)?,
        (Some(Bson::Int64(a)), Bson::Int32(b)) => checked_i64(path, *a, *b as i64)?,
        (Some(Bson::Int64(a)), Bson::Int64(b)) => checked_i64(path, *a, *b)?,
        (Some(Bson::Double(a)), Bson::Double(b)) => Bson::Double(a + b),
        (Some(Bson::Int32(a)), Bson::Double(b)) => Bson::Double(*a as f64 + b),
        (Some(Bson::Int64(a)), Bson::Double(b)) => Bson::Double(*a as f64 + b),
        (Some(Bson::Double(a)), Bson::Int32(b)) => Bson::Double(a + *b as f64),
        (Some(Bson::Double(a)), Bson::Int64(b)) => Bson::Double(a + *b as f64),
        (Some(other), _) => {
            return Err(UpdateError::TypeMismatch {
                operator: "$inc",
                path: path.clone(),
                found: document::type_name(other),
            });
        }
    };

    document::set(doc, path, result, ArrayTraversal::ByIndex)
}

fn checked_i64(path: &FieldPath, a: i64, b: i64) -> Result<Bson, UpdateError> {
    a.checked_add(b)
        .map(Bson::Int64)
        .ok_or_else(|| UpdateError::InvalidUpdate(format!("$inc on '{path}' overflows a 64-bit integer")))
}

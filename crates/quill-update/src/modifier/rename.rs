use bson::Document;
use quill_path::{FieldPath, PathConflict};
use tracing::trace;

use crate::document::{self, ArrayTraversal};
use crate::error::UpdateError;

/// `$rename`: move the value at `source` to `dest`.
///
/// A missing source is a no-op. Neither path may pass through an array, and
/// the destination route is checked before anything is removed, so a failed
/// rename leaves `doc` as it was. The emptied parent of `source` is kept.
pub fn apply_rename(doc: &mut Document, source: &FieldPath, dest: &FieldPath) -> Result<bool, UpdateError> {
    if source.conflicts_with(dest) {
        return Err(PathConflict {
            path: dest.clone(),
            conflicts_with: source.clone(),
        }
        .into());
    }

    if document::get(doc, source, ArrayTraversal::Forbidden)?.is_none() {
        trace!(%source, "rename source missing, nothing to do");
        return Ok(false);
    }
    document::check_route(doc, dest, ArrayTraversal::Forbidden)?;

    let Some(value) = document::remove(doc, source, ArrayTraversal::Forbidden)? else {
        return Ok(false);
    };
    document::set(doc, dest, value, ArrayTraversal::Forbidden)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use bson::{Bson, doc};

    use super::*;
    use crate::error::ErrorCode;

    fn rename(doc: &mut Document, from: &str, to: &str) -> Result<bool, UpdateError> {
        apply_rename(
            doc,
            &FieldPath::parse(from).unwrap(),
            &FieldPath::parse(to).unwrap(),
        )
    }

    fn keys(doc: &Document) -> Vec<&str> {
        doc.keys().map(String::as_str).collect()
    }

    #[test]
    fn top_level() {
        let mut doc = doc! { "a": 1 };
        assert!(rename(&mut doc, "a", "b").unwrap());
        assert_eq!(doc, doc! { "b": 1 });
    }

    #[test]
    fn moves_whole_subtree() {
        let mut doc = doc! { "a": { "c": 1 } };
        rename(&mut doc, "a", "b").unwrap();
        assert_eq!(doc, doc! { "b": { "c": 1 } });
    }

    #[test]
    fn moves_arrays_as_values() {
        let mut doc = doc! { "a": [5] };
        rename(&mut doc, "a", "b").unwrap();
        assert_eq!(doc, doc! { "b": [5] });
    }

    #[test]
    fn nested_source_to_top_level_appends() {
        let mut doc = doc! { "a": { "b": 1, "c": 2 } };
        rename(&mut doc, "a.b", "d").unwrap();
        assert_eq!(doc, doc! { "a": { "c": 2 }, "d": 1 });
        assert_eq!(keys(&doc), ["a", "d"]);
    }

    #[test]
    fn emptied_parent_is_kept() {
        let mut doc = doc! { "a": { "b": 1 } };
        rename(&mut doc, "a.b", "d").unwrap();
        assert_eq!(doc, doc! { "a": {}, "d": 1 });
    }

    #[test]
    fn within_same_parent() {
        let mut doc = doc! { "a": { "z": 1, "b": 1 } };
        rename(&mut doc, "a.b", "a.c").unwrap();
        assert_eq!(doc, doc! { "a": { "z": 1, "c": 1 } });
    }

    #[test]
    fn overwrites_existing_destination_in_place() {
        let mut doc = doc! { "a": { "z": 1, "b": 1, "c": 2, "y": 0 } };
        rename(&mut doc, "a.b", "a.c").unwrap();
        let inner = doc.get_document("a").unwrap();
        assert_eq!(keys(inner), ["z", "c", "y"]);
        assert_eq!(inner.get_i32("c").unwrap(), 1);
    }

    #[test]
    fn creates_destination_parents() {
        let mut doc = doc! { "a": 1 };
        rename(&mut doc, "a", "b.c").unwrap();
        assert_eq!(doc, doc! { "b": { "c": 1 } });
    }

    #[test]
    fn into_existing_empty_object() {
        let mut doc = doc! { "a": 1, "b": {} };
        rename(&mut doc, "a", "b.c").unwrap();
        assert_eq!(doc, doc! { "b": { "c": 1 } });
    }

    #[test]
    fn numeric_looking_top_level_keys() {
        let mut doc = doc! { "0": 1 };
        rename(&mut doc, "0", "5").unwrap();
        assert_eq!(doc, doc! { "5": 1 });
    }

    #[test]
    fn missing_source_is_noop() {
        let mut doc = doc! { "a": 1 };
        assert!(!rename(&mut doc, "b", "c").unwrap());
        assert_eq!(doc, doc! { "a": 1 });

        let mut empty = doc! {};
        assert!(!rename(&mut empty, "b", "c").unwrap());
        assert!(empty.is_empty());
    }

    #[test]
    fn same_path_conflicts() {
        let mut doc = doc! { "a": 1 };
        let err = rename(&mut doc, "a", "a").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConflictingPaths);
    }

    #[test]
    fn source_through_array_conflicts() {
        let base = doc! { "a": [1], "b": { "c": [2] }, "d": [{ "e": 3 }], "f": 4 };
        for (from, to) in [
            ("a.0", "f"),
            ("a.0", "g"),
            ("b.c.0", "f"),
            ("d.e", "d.f"),
            ("d.e", "f"),
            ("d.f", "d.e"),
            ("d.0.e", "d.f"),
            ("d.0.e", "f"),
            ("f.g", "a"),
        ] {
            let mut doc = base.clone();
            let err = rename(&mut doc, from, to).unwrap_err();
            assert_eq!(err.code(), ErrorCode::PathTypeConflict, "{from} -> {to}");
            assert_eq!(doc, base, "{from} -> {to} must not modify");
        }
    }

    #[test]
    fn destination_through_array_or_scalar_conflicts() {
        let base = doc! { "a": [1], "b": { "c": [2] }, "d": [{ "e": 3 }], "f": 4 };
        for (from, to) in [
            ("f", "a.0"),
            ("f", "b.c.0"),
            ("f", "d.e"),
            ("f", "d.0.e"),
            ("a", "f.g"),
        ] {
            let mut doc = base.clone();
            let err = rename(&mut doc, from, to).unwrap_err();
            assert_eq!(err.code(), ErrorCode::PathTypeConflict, "{from} -> {to}");
            assert_eq!(doc, base, "{from} -> {to} must not modify");
        }
    }

    #[test]
    fn round_trip_restores_fields() {
        let original = doc! { "x": 0, "a": { "k": [1, 2] }, "y": Bson::Null };
        let mut doc = original.clone();
        rename(&mut doc, "a", "b").unwrap();
        rename(&mut doc, "b", "a").unwrap();
        assert_eq!(doc, original);
        assert_eq!(keys(&doc), ["x", "y", "a"]);
    }
}

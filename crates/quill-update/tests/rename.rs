use bson::{Document, doc};
use quill_update::{ErrorCode, NoIndexes, UpdateConfig, prepare_update};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Apply `update` to a copy of `start`; the error code on failure.
fn run(start: &Document, update: Document) -> Result<Document, ErrorCode> {
    init_tracing();
    let mut doc = start.clone();
    let prepared = prepare_update(&update, &UpdateConfig::default()).map_err(|e| e.code())?;
    prepared
        .apply(&mut doc, &mut NoIndexes)
        .map_err(|e| e.code())?;
    Ok(doc)
}

fn keys(doc: &Document) -> Vec<&str> {
    doc.keys().map(String::as_str).collect()
}

#[track_caller]
fn good(start: Document, update: Document, expected: Document) {
    let got = run(&start, update.clone()).unwrap_or_else(|code| panic!("{update} failed: {code}"));
    assert_eq!(got, expected, "{update}");
    assert_eq!(keys(&got), keys(&expected), "field order after {update}");
}

#[track_caller]
fn bad(start: &Document, update: Document, code: ErrorCode) {
    match run(start, update.clone()) {
        Ok(doc) => panic!("{update} should fail, produced {doc}"),
        Err(got) => assert_eq!(got, code, "{update}"),
    }
}

// ── Path validation ─────────────────────────────────────────────

#[test]
fn malformed_paths_are_invalid() {
    let start = doc! { "_id": 1, "a": 2 };
    for (from, to) in [
        ("", "a"),
        ("a", ""),
        (".a", "b"),
        ("a", ".b"),
        ("a.", "b"),
        ("a", "b."),
        ("a..b", "c"),
        ("a.$", "b"),
        ("a", "b.$"),
    ] {
        bad(&start, doc! { "$rename": { from: to } }, ErrorCode::InvalidPath);
    }
}

#[test]
fn self_and_ancestor_renames_conflict() {
    let start = doc! { "a": { "b": 1 } };
    bad(&start, doc! { "$rename": { "a": "a" } }, ErrorCode::ConflictingPaths);
    bad(&start, doc! { "$rename": { "a.b": "a" } }, ErrorCode::ConflictingPaths);
    bad(&start, doc! { "$rename": { "a": "a.b" } }, ErrorCode::ConflictingPaths);
}

#[test]
fn id_cannot_be_renamed() {
    let start = doc! { "_id": 1, "a": 2 };
    bad(&start, doc! { "$rename": { "_id": "a" } }, ErrorCode::ImmutableField);
}

// ── Conflicts with other modifiers ──────────────────────────────

#[test]
fn overlapping_modifiers_conflict() {
    let start = doc! { "_id": 1, "a": 2 };
    for update in [
        doc! { "$set": { "b": 1 }, "$rename": { "a": "b" } },
        doc! { "$rename": { "a": "b" }, "$set": { "b": 1 } },
        doc! { "$rename": { "a": "b" }, "$set": { "a": 1 } },
        doc! { "$set": { "b.c": 1 }, "$rename": { "a": "b" } },
        doc! { "$set": { "b": 1 }, "$rename": { "a": "b.c" } },
        doc! { "$rename": { "a": "b" }, "$set": { "b.c": 1 } },
        doc! { "$rename": { "a": "b.c" }, "$set": { "b": 1 } },
    ] {
        bad(&start, update, ErrorCode::ConflictingPaths);
    }
}

// ── Structural conflicts ────────────────────────────────────────

#[test]
fn renames_through_arrays_and_scalars_fail() {
    let start = doc! { "a": [1], "b": { "c": [2] }, "d": [{ "e": 3 }], "f": 4 };
    for (from, to) in [
        ("a.0", "f"),
        ("a.0", "g"),
        ("f", "a.0"),
        ("b.c.0", "f"),
        ("f", "b.c.0"),
        ("d.e", "d.f"),
        ("d.e", "f"),
        ("d.f", "d.e"),
        ("f", "d.e"),
        ("d.0.e", "d.f"),
        ("d.0.e", "f"),
        ("d.f", "d.0.e"),
        ("f", "d.0.e"),
        ("f.g", "a"),
        ("a", "f.g"),
    ] {
        bad(&start, doc! { "$rename": { from: to } }, ErrorCode::PathTypeConflict);
    }
}

// ── Successful renames ──────────────────────────────────────────

#[test]
fn top_level_renames() {
    good(doc! { "a": 1 }, doc! { "$rename": { "a": "b" } }, doc! { "b": 1 });
    good(doc! { "a": 1 }, doc! { "$rename": { "a": "bb" } }, doc! { "bb": 1 });
    good(doc! { "b": 1 }, doc! { "$rename": { "b": "a" } }, doc! { "a": 1 });
    good(doc! { "bb": 1 }, doc! { "$rename": { "bb": "a" } }, doc! { "a": 1 });
}

#[test]
fn renames_within_a_subdocument() {
    good(
        doc! { "a": { "y": 1 } },
        doc! { "$rename": { "a.y": "a.z" } },
        doc! { "a": { "z": 1 } },
    );
    good(
        doc! { "a": { "zz": 1 } },
        doc! { "$rename": { "a.zz": "a.y" } },
        doc! { "a": { "y": 1 } },
    );
    good(
        doc! { "a": { "z": 1, "b": 1 } },
        doc! { "$rename": { "a.b": "a.c" } },
        doc! { "a": { "z": 1, "c": 1 } },
    );
    good(
        doc! { "a": { "z": 1, "tomato": 1, "potato": 1 } },
        doc! { "$rename": { "a.tomato": "a.potato" } },
        doc! { "a": { "z": 1, "potato": 1 } },
    );
}

#[test]
fn subdocuments_move_whole() {
    good(doc! { "a": { "c": 1 } }, doc! { "$rename": { "a": "b" } }, doc! { "b": { "c": 1 } });
    good(doc! { "a": [5] }, doc! { "$rename": { "a": "b" } }, doc! { "b": [5] });
}

#[test]
fn existing_destination_is_replaced() {
    good(doc! { "a": 1, "b": 2 }, doc! { "$rename": { "a": "b" } }, doc! { "b": 1 });
    good(doc! { "aa": 1, "b": 2 }, doc! { "$rename": { "aa": "b" } }, doc! { "b": 1 });
    good(doc! { "a": 1, "bb": 2 }, doc! { "$rename": { "a": "bb" } }, doc! { "bb": 1 });
}

#[test]
fn destination_parents_are_created() {
    good(doc! { "a": 1 }, doc! { "$rename": { "a": "b.c" } }, doc! { "b": { "c": 1 } });
    good(doc! { "a": 1, "b": {} }, doc! { "$rename": { "a": "b.c" } }, doc! { "b": { "c": 1 } });
    good(
        doc! { "a": { "z": 1, "b": 1, "c": 1 } },
        doc! { "$rename": { "a.b": "aa.c" } },
        doc! { "a": { "z": 1, "c": 1 }, "aa": { "c": 1 } },
    );
}

#[test]
fn nested_source_to_top_level() {
    good(
        doc! { "a": { "b": 1, "c": 2 } },
        doc! { "$rename": { "a.b": "d" } },
        doc! { "a": { "c": 2 }, "d": 1 },
    );
    good(doc! { "a": { "b": 1 } }, doc! { "$rename": { "a.b": "d" } }, doc! { "a": {}, "d": 1 });
}

#[test]
fn missing_source_is_a_noop() {
    good(doc! { "a": 1 }, doc! { "$rename": { "b": "c" } }, doc! { "a": 1 });
    good(doc! {}, doc! { "$rename": { "b": "c" } }, doc! {});
    good(doc! { "a": 1 }, doc! { "$rename": { "x.y": "c" } }, doc! { "a": 1 });
}

#[test]
fn numeric_keys_are_object_keys() {
    good(doc! { "0": 1 }, doc! { "$rename": { "0": "5" } }, doc! { "5": 1 });
}

#[test]
fn rename_alongside_set() {
    good(
        doc! { "a": 1, "b": 2 },
        doc! { "$rename": { "a": "c" }, "$set": { "b": 5 } },
        doc! { "b": 5, "c": 1 },
    );
    good(
        doc! { "a": 1, "b": 2 },
        doc! { "$rename": { "z": "c" }, "$set": { "b": 5 } },
        doc! { "a": 1, "b": 5 },
    );
}

#[test]
fn rename_there_and_back_restores_fields() {
    let start = doc! { "a": { "k": 1 }, "m": "x" };
    let there = run(&start, doc! { "$rename": { "a": "b" } }).unwrap();
    let back = run(&there, doc! { "$rename": { "b": "a" } }).unwrap();
    assert_eq!(back, start);
    assert_eq!(keys(&back), ["m", "a"]);
}

use bson::{Document, RawDocumentBuf};
use quill_path::{ConflictSet, FieldPath};
use tracing::debug;

use crate::config::UpdateConfig;
use crate::error::UpdateError;
use crate::index::{IndexHook, NoIndexes};
use crate::modifier::{FieldModifier, ModifierOp};
use crate::parse::parse_update;

/// A parsed, validated and conflict-free update, reusable across documents.
#[derive(Debug, Clone)]
pub struct PreparedUpdate {
    modifiers: Vec<FieldModifier>,
    touched: ConflictSet,
    config: UpdateConfig,
}

/// What applying a [`PreparedUpdate`] did to one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOutcome {
    pub modified: bool,
    /// Renames that actually moved a value, as `(old, new)`.
    pub renamed: Vec<(FieldPath, FieldPath)>,
    /// Paths written or removed by the other modifiers.
    pub written: Vec<FieldPath>,
}

/// Parse `update` and reject it if any two touched paths overlap.
///
/// Runs once per update, before any document is read.
pub fn prepare_update(update: &Document, config: &UpdateConfig) -> Result<PreparedUpdate, UpdateError> {
    let modifiers = parse_update(update, config)?;

    let mut touched = ConflictSet::new();
    for modifier in &modifiers {
        for path in modifier.touched_paths() {
            touched.insert(path.clone())?;
        }
    }

    debug!(modifiers = modifiers.len(), "prepared update");
    Ok(PreparedUpdate {
        modifiers,
        touched,
        config: config.clone(),
    })
}

/// Prepare `update` with default limits and apply it to `doc` without indexes.
pub fn apply_update(doc: &mut Document, update: &Document) -> Result<bool, UpdateError> {
    let prepared = prepare_update(update, &UpdateConfig::default())?;
    Ok(prepared.apply(doc, &mut NoIndexes)?.modified)
}

impl PreparedUpdate {
    pub fn modifiers(&self) -> &[FieldModifier] {
        &self.modifiers
    }

    /// Whether any modifier touches `path`, an ancestor of it, or a descendant.
    pub fn touches(&self, path: &FieldPath) -> bool {
        self.touched.iter().any(|p| p.conflicts_with(path))
    }

    /// Apply every modifier in order.
    ///
    /// The modifiers run against a working copy; `doc` is replaced only when
    /// all of them succeed and the result fits the size limit. The hook is
    /// notified after the replacement.
    pub fn apply<H>(&self, doc: &mut Document, hook: &mut H) -> Result<ApplyOutcome, UpdateError>
    where
        H: IndexHook + ?Sized,
    {
        let mut working = doc.clone();
        let mut outcome = ApplyOutcome::default();

        for modifier in &self.modifiers {
            let changed = modifier.apply(&mut working).inspect_err(|e| {
                debug!(
                    operator = modifier.operator(),
                    path = %modifier.path,
                    error = %e,
                    "modifier failed"
                );
            })?;
            if !changed {
                continue;
            }
            outcome.modified = true;
            match &modifier.op {
                ModifierOp::Rename(dest) => {
                    outcome.renamed.push((modifier.path.clone(), dest.clone()));
                }
                _ => outcome.written.push(modifier.path.clone()),
            }
        }

        if !outcome.modified {
            return Ok(outcome);
        }

        let size = RawDocumentBuf::try_from(&working)
            .map_err(|e| UpdateError::Bson(e.to_string()))?
            .as_bytes()
            .len();
        if size > self.config.max_document_size {
            return Err(UpdateError::DocumentTooLarge {
                size,
                max: self.config.max_document_size,
            });
        }

        *doc = working;

        for (old, new) in &outcome.renamed {
            if hook.covers(old) || hook.covers(new) {
                hook.on_field_renamed(doc, old, new);
            }
        }
        for path in &outcome.written {
            if hook.covers(path) {
                hook.on_field_modified(doc, path);
            }
        }

        debug!(
            renamed = outcome.renamed.len(),
            written = outcome.written.len(),
            "applied update"
        );
        Ok(outcome)
    }
}

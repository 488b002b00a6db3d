use bson::{Bson, Document};
use quill_path::{FieldPath, PathRole, validate};

use crate::config::UpdateConfig;
use crate::error::UpdateError;
use crate::modifier::{FieldModifier, ModifierOp};

const ID_FIELD: &str = "_id";

/// Parse an update document into its field modifiers, in document order.
///
/// Recognizes `$set`, `$unset`, `$inc` and `$rename` blocks, each mapping field
/// paths to operands. Every path is parsed and validated for its role here;
/// conflicts between paths are checked by [`crate::prepare_update`].
///
/// # Errors
///
/// Fails on unknown operators, plain (non-`$`) fields, empty documents or
/// blocks, malformed or reserved paths, paths under `_id`, non-numeric `$inc`
/// amounts and non-string `$rename` destinations.
pub fn parse_update(update: &Document, config: &UpdateConfig) -> Result<Vec<FieldModifier>, UpdateError> {
    if update.is_empty() {
        return Err(UpdateError::InvalidUpdate("empty update document".into()));
    }

    let mut modifiers = Vec::new();
    for (key, value) in update {
        match key.as_str() {
            "$set" => parse_set_fields(value, config, &mut modifiers)?,
            "$unset" => parse_unset_fields(value, config, &mut modifiers)?,
            "$inc" => parse_inc_fields(value, config, &mut modifiers)?,
            "$rename" => parse_rename_fields(value, config, &mut modifiers)?,
            k if k.starts_with('$') => {
                return Err(UpdateError::InvalidUpdate(format!("unknown operator: {k}")));
            }
            k => {
                return Err(UpdateError::InvalidUpdate(format!(
                    "modifiers and non-modifiers cannot be mixed (found plain field '{k}')"
                )));
            }
        }
    }
    Ok(modifiers)
}

// ── Internal helpers ────────────────────────────────────────────

fn operator_block<'a>(operator: &str, value: &'a Bson) -> Result<&'a Document, UpdateError> {
    match value {
        Bson::Document(block) if !block.is_empty() => Ok(block),
        Bson::Document(_) => Err(UpdateError::InvalidUpdate(format!(
            "{operator} must name at least one field"
        ))),
        _ => Err(UpdateError::InvalidUpdate(format!(
            "{operator} value must be a document"
        ))),
    }
}

fn parse_path(field: &str, role: PathRole, config: &UpdateConfig) -> Result<FieldPath, UpdateError> {
    let path = FieldPath::parse_with_depth(field, config.max_path_depth)?;
    validate(&path, role)?;
    if path.first() == ID_FIELD {
        return Err(UpdateError::ImmutableField { path });
    }
    Ok(path)
}

fn parse_set_fields(value: &Bson, config: &UpdateConfig, out: &mut Vec<FieldModifier>) -> Result<(), UpdateError> {
    for (field, operand) in operator_block("$set", value)? {
        out.push(FieldModifier {
            path: parse_path(field, PathRole::UpdateTarget, config)?,
            op: ModifierOp::Set(operand.clone()),
        });
    }
    Ok(())
}

/// `$unset` operands are ignored (`{ "field": "" }` by convention).
fn parse_unset_fields(value: &Bson, config: &UpdateConfig, out: &mut Vec<FieldModifier>) -> Result<(), UpdateError> {
    for (field, _) in operator_block("$unset", value)? {
        out.push(FieldModifier {
            path: parse_path(field, PathRole::UnsetTarget, config)?,
            op: ModifierOp::Unset,
        });
    }
    Ok(())
}

fn parse_inc_fields(value: &Bson, config: &UpdateConfig, out: &mut Vec<FieldModifier>) -> Result<(), UpdateError> {
    for (field, amount) in operator_block("$inc", value)? {
        if !matches!(amount, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) {
            return Err(UpdateError::InvalidUpdate(format!(
                "$inc value for '{field}' must be numeric"
            )));
        }
        out.push(FieldModifier {
            path: parse_path(field, PathRole::UpdateTarget, config)?,
            op: ModifierOp::Inc(amount.clone()),
        });
    }
    Ok(())
}

fn parse_rename_fields(value: &Bson, config: &UpdateConfig, out: &mut Vec<FieldModifier>) -> Result<(), UpdateError> {
    for (field, target) in operator_block("$rename", value)? {
        let Bson::String(target) = target else {
            return Err(UpdateError::InvalidUpdate(format!(
                "$rename value for '{field}' must be a string"
            )));
        };
        let source = parse_path(field, PathRole::RenameSource, config)?;
        let dest = parse_path(target, PathRole::RenameTarget, config)?;
        out.push(FieldModifier {
            path: source,
            op: ModifierOp::Rename(dest),
        });
    }
    Ok(())
}

mod ops;
mod rename;

use bson::{Bson, Document};
use quill_path::FieldPath;

use crate::error::UpdateError;

pub use rename::apply_rename;

/// A single field-level update operator.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifierOp {
    /// Set a field to a value, creating it and any missing parents.
    Set(Bson),
    /// Remove a field.
    Unset,
    /// Add a numeric amount to a field, treating a missing field as zero.
    Inc(Bson),
    /// Move the field's value to the destination path.
    Rename(FieldPath),
}

/// A path + operator pair within one update.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldModifier {
    pub path: FieldPath,
    pub op: ModifierOp,
}

impl FieldModifier {
    /// Operator name as written in an update document.
    pub fn operator(&self) -> &'static str {
        match self.op {
            ModifierOp::Set(_) => "$set",
            ModifierOp::Unset => "$unset",
            ModifierOp::Inc(_) => "$inc",
            ModifierOp::Rename(_) => "$rename",
        }
    }

    /// Every path this modifier writes or removes. A rename touches both its
    /// source and its destination.
    pub fn touched_paths(&self) -> impl Iterator<Item = &FieldPath> {
        let dest = match &self.op {
            ModifierOp::Rename(dest) => Some(dest),
            _ => None,
        };
        std::iter::once(&self.path).chain(dest)
    }

    /// Apply to `doc`, returning whether anything changed.
    pub fn apply(&self, doc: &mut Document) -> Result<bool, UpdateError> {
        match &self.op {
            ModifierOp::Set(value) => ops::op_set(doc, &self.path, value),
            ModifierOp::Unset => ops::op_unset(doc, &self.path),
            ModifierOp::Inc(amount) => ops::op_inc(doc, &self.path, amount),
            ModifierOp::Rename(dest) => apply_rename(doc, &self.path, dest),
        }
    }
}

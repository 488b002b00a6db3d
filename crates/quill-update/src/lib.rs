mod config;
pub mod document;
mod error;
mod executor;
mod index;
pub mod modifier;
mod parse;

pub use config::UpdateConfig;
pub use document::ArrayTraversal;
pub use error::{ErrorCode, UpdateError};
pub use executor::{ApplyOutcome, PreparedUpdate, apply_update, prepare_update};
pub use index::{IndexHook, NoIndexes};
pub use modifier::{FieldModifier, ModifierOp};
pub use parse::parse_update;
pub use quill_path::{FieldPath, PathConflict, PathError};

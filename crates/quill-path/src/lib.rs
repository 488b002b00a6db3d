mod conflict;
mod error;
mod field_path;
mod validate;

pub use conflict::{ConflictSet, PathConflict, check_conflicts};
pub use error::PathError;
pub use field_path::{DEFAULT_MAX_DEPTH, FieldPath, array_index, is_positional_segment};
pub use validate::{PathRole, validate};

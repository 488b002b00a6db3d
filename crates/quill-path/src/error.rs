use thiserror::Error;

/// A field path string that cannot be used by an update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("an empty update path is not valid")]
    Empty,
    #[error("the update path '{path}' contains an empty field name")]
    EmptySegment { path: String },
    #[error("the update path '{path}' is nested deeper than {max} levels")]
    TooDeep { path: String, max: usize },
    #[error("the update path '{path}' contains a positional operator, which is not supported here")]
    Positional { path: String },
    #[error("the update path '{path}' contains the reserved field name '{segment}'")]
    ReservedSegment { path: String, segment: String },
}

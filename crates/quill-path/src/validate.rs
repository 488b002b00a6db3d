use crate::error::PathError;
use crate::field_path::FieldPath;

/// What an update intends to do with a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRole {
    /// Written by `$set` / `$inc`.
    UpdateTarget,
    /// Removed by `$unset`.
    UnsetTarget,
    /// Read and removed by `$rename`.
    RenameSource,
    /// Written by `$rename`.
    RenameTarget,
}

/// Check the context-dependent rules a parsed path must also satisfy.
///
/// Positional placeholders are rejected in every role, since there is no
/// matched query element to bind them to. Written paths may not introduce
/// `$`-prefixed field names, and rename refuses them on either side.
pub fn validate(path: &FieldPath, role: PathRole) -> Result<(), PathError> {
    if path.positional_index().is_some() {
        return Err(PathError::Positional {
            path: path.to_string(),
        });
    }

    let reserved_allowed = matches!(role, PathRole::UnsetTarget);
    if !reserved_allowed
        && let Some(segment) = path.parts().iter().find(|p| p.starts_with('$'))
    {
        return Err(PathError::ReservedSegment {
            path: path.to_string(),
            segment: segment.clone(),
        });
    }

    Ok(())
}

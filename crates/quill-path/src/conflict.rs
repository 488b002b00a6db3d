use thiserror::Error;

use crate::field_path::FieldPath;

/// Two paths of one update that target overlapping subtrees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot update '{path}' and '{conflicts_with}' at the same time")]
pub struct PathConflict {
    /// The path that was being added.
    pub path: FieldPath,
    /// The path already present that it clashes with.
    pub conflicts_with: FieldPath,
}

/// A set of field paths none of which is equal to, or an ancestor of, another.
///
/// Kept sorted by segments. Because the set never holds two conflicting
/// paths, an ancestor of a new path can only be its immediate predecessor and
/// a descendant can only be its immediate successor, so each insert is a
/// binary search plus two neighbour checks.
#[derive(Debug, Clone, Default)]
pub struct ConflictSet {
    paths: Vec<FieldPath>,
}

impl ConflictSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `path` unless it conflicts with a member.
    pub fn insert(&mut self, path: FieldPath) -> Result<(), PathConflict> {
        match self.find_slot(&path) {
            Ok(pos) => {
                self.paths.insert(pos, path);
                Ok(())
            }
            Err(existing) => Err(PathConflict {
                conflicts_with: existing.clone(),
                path,
            }),
        }
    }

    /// The member `path` would conflict with, if any.
    pub fn find_conflict(&self, path: &FieldPath) -> Option<&FieldPath> {
        self.find_slot(path).err()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldPath> {
        self.paths.iter()
    }

    fn find_slot(&self, path: &FieldPath) -> Result<usize, &FieldPath> {
        let pos = match self.paths.binary_search(path) {
            Ok(found) => return Err(&self.paths[found]),
            Err(pos) => pos,
        };
        if pos > 0 && self.paths[pos - 1].is_prefix_of(path) {
            return Err(&self.paths[pos - 1]);
        }
        if let Some(next) = self.paths.get(pos)
            && path.is_prefix_of(next)
        {
            return Err(next);
        }
        Ok(pos)
    }
}

/// Fail on the first pair of paths where one equals or contains the other.
pub fn check_conflicts<'a, I>(paths: I) -> Result<(), PathConflict>
where
    I: IntoIterator<Item = &'a FieldPath>,
{
    let mut set = ConflictSet::new();
    for path in paths {
        set.insert(path.clone())?;
    }
    Ok(())
}

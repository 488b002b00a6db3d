use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PathError;

/// Deepest path accepted by [`FieldPath::parse`].
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// A parsed dot-notation field path such as `address.city`.
///
/// Parsed once and never mutated. Equality, hashing and ordering all work on
/// the segment sequence, so an ancestor always sorts immediately before its
/// descendants: `a` < `a.b` < `a.c` < `ab`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    parts: Vec<String>,
    dotted: String,
}

impl FieldPath {
    /// Parse a dotted path, rejecting empty strings and empty segments.
    ///
    /// Leading, trailing and doubled dots all produce an empty segment.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        Self::parse_with_depth(path, DEFAULT_MAX_DEPTH)
    }

    /// Like [`FieldPath::parse`] with an explicit depth limit.
    pub fn parse_with_depth(path: &str, max_depth: usize) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let mut parts = Vec::new();
        for part in path.split('.') {
            if part.is_empty() {
                return Err(PathError::EmptySegment {
                    path: path.to_string(),
                });
            }
            parts.push(part.to_string());
        }

        if parts.len() > max_depth {
            return Err(PathError::TooDeep {
                path: path.to_string(),
                max: max_depth,
            });
        }

        Ok(Self {
            parts,
            dotted: path.to_string(),
        })
    }

    /// The original dotted form.
    pub fn as_str(&self) -> &str {
        &self.dotted
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Number of segments. Never zero.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn first(&self) -> &str {
        &self.parts[0]
    }

    pub fn last(&self) -> &str {
        &self.parts[self.parts.len() - 1]
    }

    /// True if `self` equals `other` or is one of its ancestors.
    pub fn is_prefix_of(&self, other: &FieldPath) -> bool {
        other.parts.starts_with(&self.parts)
    }

    /// Two paths conflict when one of them is a prefix of the other.
    pub fn conflicts_with(&self, other: &FieldPath) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Number of leading segments shared with `other`.
    pub fn common_prefix_len(&self, other: &FieldPath) -> usize {
        self.parts
            .iter()
            .zip(&other.parts)
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Index of the first positional segment (`$` or `$[...]`), if any.
    pub fn positional_index(&self) -> Option<usize> {
        self.parts.iter().position(|p| is_positional_segment(p))
    }
}

/// `$` and the `$[]` / `$[ident]` array placeholders.
pub fn is_positional_segment(segment: &str) -> bool {
    segment == "$" || (segment.starts_with("$[") && segment.ends_with(']'))
}

/// Interpret a segment as an array index.
///
/// Only canonical decimal numbers qualify: `0`, `7`, `12`, but not `07` or `+1`.
pub fn array_index(segment: &str) -> Option<usize> {
    let bytes = segment.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    segment.parse().ok()
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted)
    }
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldPath({:?})", self.dotted)
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.dotted
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.dotted)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

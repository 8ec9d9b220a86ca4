//! Nesting paths — the root-to-leaf chain of raw names identifying one entity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::NamingError;

/// Ordered, non-empty sequence of raw (un-normalized) names, root first.
///
/// Two paths denote the same entity iff their segments are element-wise equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct NestingPath {
    segments: Vec<String>,
}

impl NestingPath {
    /// Build a path from raw segments.
    ///
    /// # Errors
    ///
    /// Returns [`NamingError::EmptyPath`] if `segments` is empty.
    pub fn new<I, S>(segments: I) -> Result<Self, NamingError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(NamingError::EmptyPath);
        }
        Ok(Self { segments })
    }

    /// Path of a top-level stream.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// Extend this path by one nested level.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The entity's own name.
    #[inline]
    pub fn leaf(&self) -> &str {
        // Non-empty by construction.
        &self.segments[self.segments.len() - 1]
    }

    /// All containing names, excluding the leaf. Empty for a root path.
    #[inline]
    pub fn parent(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.len() == 1
    }

    /// Every ancestor of this path followed by the path itself, shortest first.
    pub fn ancestors_and_self(&self) -> impl Iterator<Item = NestingPath> + '_ {
        (1..=self.segments.len()).map(|n| Self {
            segments: self.segments[..n].to_vec(),
        })
    }
}

impl fmt::Display for NestingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl TryFrom<Vec<String>> for NestingPath {
    type Error = NamingError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<NestingPath> for Vec<String> {
    fn from(path: NestingPath) -> Self {
        path.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_path() {
        let empty: [&str; 0] = [];
        assert_eq!(NestingPath::new(empty), Err(NamingError::EmptyPath));
    }

    #[test]
    fn leaf_and_parent() {
        let path = NestingPath::new(["a", "b", "c"]).unwrap();
        assert_eq!(path.leaf(), "c");
        assert_eq!(path.parent(), ["a".to_string(), "b".to_string()]);
        assert!(!path.is_root());

        let root = NestingPath::root("a");
        assert!(root.is_root());
        assert!(root.parent().is_empty());
        assert_eq!(root.child("b").segments(), ["a", "b"]);
    }

    #[test]
    fn ancestors_are_shortest_first() {
        let path = NestingPath::new(["a", "b", "c"]).unwrap();
        let all: Vec<String> = path.ancestors_and_self().map(|p| p.to_string()).collect();
        assert_eq!(all, ["a", "a.b", "a.b.c"]);
    }

    #[test]
    fn serde_rejects_empty_array() {
        let path: NestingPath = serde_json::from_str(r#"["parent","child"]"#).unwrap();
        assert_eq!(path.to_string(), "parent.child");
        assert!(serde_json::from_str::<NestingPath>("[]").is_err());
    }
}

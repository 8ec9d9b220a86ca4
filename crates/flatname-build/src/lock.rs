//! `names.lock.toml` — the last accepted name assignment.
//!
//! Tables already materialized downstream must keep their names. Comparing a
//! fresh resolution against the lock reveals paths whose table name changed,
//! typically because a newly added path collided with them.

use std::collections::BTreeMap;
use std::path::Path;

use flatname::{
    Destination, IdentifierNormalizer, NestingPath, RegistryError, StandardNormalizer,
    TableNameRegistry,
};
use serde::{Deserialize, Serialize};

/// One locked assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub schema: String,
    pub path: NestingPath,
    pub table: String,
    pub file: String,
}

/// Contents of a lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    /// RFC 3339 timestamp of the run that wrote the lock
    pub generated_at: String,
    pub destination: Destination,
    #[serde(default)]
    pub entries: Vec<LockEntry>,
}

/// A locked path whose table name changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renamed {
    pub schema: String,
    pub path: NestingPath,
    pub locked: String,
    pub current: String,
}

/// Differences between a lock and a fresh resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockDiff {
    pub renamed: Vec<Renamed>,
    pub added: Vec<LockEntry>,
    pub removed: Vec<LockEntry>,
}

impl LockDiff {
    pub fn is_empty(&self) -> bool {
        self.renamed.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }
}

impl LockFile {
    /// Snapshot a resolved registry.
    pub fn from_registry<N: flatname::IdentifierNormalizer>(
        destination: Destination,
        registry: &TableNameRegistry<N>,
    ) -> Result<Self, RegistryError> {
        let entries = registry
            .entries()?
            .map(|e| LockEntry {
                schema: e.schema.clone(),
                path: e.path.clone(),
                table: e.table_name.clone(),
                file: e.file_name.clone(),
            })
            .collect();
        Ok(Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            destination,
            entries,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LockFileError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| LockFileError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, LockFileError> {
        toml::from_str(content).map_err(|e| LockFileError::Parse(e.to_string()))
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), LockFileError> {
        let body =
            toml::to_string_pretty(self).map_err(|e| LockFileError::Serialize(e.to_string()))?;
        let content = format!(
            "# Generated by flatname-build. Commit this file; delete it only to accept renames.\n\n{}",
            body
        );
        std::fs::write(path.as_ref(), content)
            .map_err(|e| LockFileError::Io(format!("{}: {}", path.as_ref().display(), e)))
    }

    /// Locked entry for `(schema, path)`.
    ///
    /// `schema` is normalized for the lock's destination first, the same way
    /// the registry keys it.
    pub fn get(&self, schema: &str, path: &NestingPath) -> Option<&LockEntry> {
        let schema = StandardNormalizer.normalize(self.destination, schema, usize::MAX);
        self.entries
            .iter()
            .find(|e| e.schema == schema && &e.path == path)
    }

    /// Compare this lock against a fresh snapshot.
    pub fn diff(&self, current: &LockFile) -> LockDiff {
        let locked: BTreeMap<(&str, &NestingPath), &LockEntry> = self
            .entries
            .iter()
            .map(|e| ((e.schema.as_str(), &e.path), e))
            .collect();
        let fresh: BTreeMap<(&str, &NestingPath), &LockEntry> = current
            .entries
            .iter()
            .map(|e| ((e.schema.as_str(), &e.path), e))
            .collect();

        let mut diff = LockDiff::default();
        for (key, old) in &locked {
            match fresh.get(key) {
                Some(new) if new.table != old.table => diff.renamed.push(Renamed {
                    schema: old.schema.clone(),
                    path: old.path.clone(),
                    locked: old.table.clone(),
                    current: new.table.clone(),
                }),
                Some(_) => {}
                None => diff.removed.push((*old).clone()),
            }
        }
        for (key, new) in &fresh {
            if !locked.contains_key(key) {
                diff.added.push((*new).clone());
            }
        }
        diff
    }
}

/// Errors reading or writing a lock file.
#[derive(Debug, thiserror::Error)]
pub enum LockFileError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
}

//! TOML configuration parser for names.toml.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use flatname::{Destination, DestinationProfile, NestingPath};
use serde::Deserialize;

/// Behavior when a previously locked path resolves to a different table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnRename {
    /// Fail the build (default, safest)
    #[default]
    Error,
    /// Emit a warning and accept the new name
    Warn,
}

/// Parsed names configuration.
#[derive(Debug, Clone)]
pub struct NamesConfig {
    pub destination: Destination,
    /// Raw identifier limit override
    pub identifier_limit: Option<usize>,
    pub on_rename: OnRename,
    /// Every `(schema, path)` to name, ancestors included
    entries: Vec<NameEntry>,
}

/// A single table-producing level of a schema.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NameEntry {
    pub schema: String,
    pub path: NestingPath,
}

/// Raw TOML structure.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNamesConfig {
    destination: String,
    identifier_limit: Option<usize>,
    #[serde(default)]
    on_rename: OnRename,
    schemas: BTreeMap<String, RawSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    /// Root-to-leaf segment lists
    paths: Vec<Vec<String>>,
}

impl NamesConfig {
    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NamesConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            NamesConfigError::Io(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, NamesConfigError> {
        let raw: RawNamesConfig =
            toml::from_str(content).map_err(|e| NamesConfigError::Parse(e.to_string()))?;

        let destination: Destination = raw
            .destination
            .parse()
            .map_err(|e: flatname::UnknownDestination| NamesConfigError::Validation(e.to_string()))?;

        if raw.schemas.is_empty() {
            return Err(NamesConfigError::Validation(
                "at least one [schemas.<name>] table is required".into(),
            ));
        }

        let entries = Self::expand_paths(&raw.schemas)?;

        Ok(Self {
            destination,
            identifier_limit: raw.identifier_limit,
            on_rename: raw.on_rename,
            entries,
        })
    }

    /// Destination profile, honoring the identifier limit override.
    pub fn profile(&self) -> DestinationProfile {
        let profile = DestinationProfile::new(self.destination);
        match self.identifier_limit {
            Some(limit) => profile.with_identifier_limit(limit),
            None => profile,
        }
    }

    /// Get all entries.
    pub fn entries(&self) -> impl Iterator<Item = &NameEntry> {
        self.entries.iter()
    }

    /// Get entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expand paths to include all ancestor levels.
    ///
    /// e.g., ["a", "b", "c"] expands to ["a"], ["a", "b"], ["a", "b", "c"]
    fn expand_paths(
        schemas: &BTreeMap<String, RawSchema>,
    ) -> Result<Vec<NameEntry>, NamesConfigError> {
        let mut entries: BTreeSet<NameEntry> = BTreeSet::new();

        for (schema, raw) in schemas {
            if schema.trim().is_empty() {
                return Err(NamesConfigError::Validation("Empty schema name not allowed".into()));
            }
            if raw.paths.is_empty() {
                return Err(NamesConfigError::Validation(format!(
                    "Schema '{}' declares no paths",
                    schema
                )));
            }

            for segments in &raw.paths {
                if segments.iter().any(|s| s.trim().is_empty()) {
                    return Err(NamesConfigError::Validation(format!(
                        "Invalid path {:?} in schema '{}': empty segment",
                        segments, schema
                    )));
                }
                let path = NestingPath::new(segments.iter().cloned()).map_err(|_| {
                    NamesConfigError::Validation(format!(
                        "Empty path not allowed in schema '{}'",
                        schema
                    ))
                })?;

                for level in path.ancestors_and_self() {
                    entries.insert(NameEntry {
                        schema: schema.clone(),
                        path: level,
                    });
                }
            }
        }

        // Sorted by schema then path for deterministic output
        Ok(entries.into_iter().collect())
    }
}

/// Errors during config parsing.
#[derive(Debug, thiserror::Error)]
pub enum NamesConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

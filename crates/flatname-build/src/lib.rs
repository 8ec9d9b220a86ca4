//! Build-time utilities for flatname.
//!
//! This crate provides tools for:
//! - Parsing `names.toml` declarations of schemas and nesting paths
//! - Resolving collision-free table names for the configured destination
//! - Managing `names.lock.toml` lock files so accepted names stay stable
//!
//! # Usage in build.rs
//!
//! ```ignore
//! // build.rs
//! fn main() {
//!     flatname_build::generate("names.toml", "target/table_names.json")
//!         .expect("Failed to resolve table names");
//! }
//! ```
//!
//! # Lock File Mechanism
//!
//! The lock file ensures that table names only change intentionally:
//!
//! - First run: writes `names.lock.toml` with every path and its table name
//! - Subsequent runs: compares the fresh resolution against the lock
//! - A locked path resolving to a different name: **error** (default) or **warning**
//!   (with `on_rename = "warn"`)
//! - Added or removed paths: accepted, lock rewritten
//!
//! A rename usually means a new path collided with an existing table, which
//! then had to take its fingerprinted name.
//!
//! To accept all renames at once, delete the lock file and rerun.

mod config;
mod lock;

pub use config::{NameEntry, NamesConfig, NamesConfigError, OnRename};
pub use lock::{LockDiff, LockEntry, LockFile, LockFileError, Renamed};

use std::path::Path;

use flatname::{ConflictRecord, RegistryError, TableNameRegistry};

/// Main entry point for build.rs integration.
///
/// Reads `names.toml`, resolves names, checks them against `names.lock.toml`,
/// and writes the schema → table → path mapping as JSON.
///
/// # Arguments
///
/// * `config_path` - Path to `names.toml`
/// * `output_path` - Path to the JSON output
///
/// # Errors
///
/// Returns an error if:
/// - `names.toml` cannot be read or parsed
/// - names cannot be resolved (unusable destination budget, unresolved collision)
/// - a locked table would be renamed and `on_rename = "error"`
/// - the lock or output file cannot be written
///
/// Returns the conflicts repaired during resolution.
pub fn generate(
    config_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<Vec<ConflictRecord>, GenerateError> {
    let config_path = config_path.as_ref();

    // Derive lock file path from config path
    let lock_path = config_path.with_extension("lock.toml");

    generate_with_lock(config_path, &lock_path, output_path)
}

/// Generate with explicit lock file path.
pub fn generate_with_lock(
    config_path: impl AsRef<Path>,
    lock_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<Vec<ConflictRecord>, GenerateError> {
    let lock_path = lock_path.as_ref();

    // 1. Parse names.toml
    let config = NamesConfig::from_file(config_path)?;

    // 2. Register every level and resolve
    let (registry, conflicts) = resolve(&config)?;
    let fresh = LockFile::from_registry(config.destination, &registry)?;

    // 3. Compare with the existing lock
    if lock_path.exists() {
        let existing = LockFile::from_file(lock_path)?;
        if existing.destination != config.destination {
            return Err(GenerateError::LockMismatch(format!(
                "flatname: lock file was written for '{}' but names.toml targets '{}'; \
                 delete the lock file to rename every table",
                existing.destination, config.destination
            )));
        }

        let diff = existing.diff(&fresh);
        if !diff.renamed.is_empty() {
            match config.on_rename {
                OnRename::Error => {
                    return Err(GenerateError::LockMismatch(format_lock_error(&diff)));
                }
                OnRename::Warn => {
                    for r in &diff.renamed {
                        tracing::warn!(
                            schema = %r.schema,
                            path = %r.path,
                            locked = %r.locked,
                            current = %r.current,
                            "locked table renamed"
                        );
                        println!(
                            "cargo:warning=flatname: table '{}.{}' for '{}' is now '{}'",
                            r.schema, r.locked, r.path, r.current
                        );
                    }
                }
            }
        }
    }

    // 4. Write resolved mapping
    std::fs::write(output_path.as_ref(), registry.to_json()?)?;

    // 5. Lock the names only once they have been emitted
    fresh.write_to_file(lock_path)?;

    Ok(conflicts)
}

/// Resolve the names declared in a config without touching the filesystem.
pub fn resolve(
    config: &NamesConfig,
) -> Result<(TableNameRegistry, Vec<ConflictRecord>), RegistryError> {
    let mut registry = TableNameRegistry::standard(config.profile());
    for entry in config.entries() {
        registry.register(&entry.schema, entry.path.clone())?;
    }
    let conflicts = registry.resolve_names()?;
    Ok((registry, conflicts))
}

fn format_lock_error(diff: &LockDiff) -> String {
    let mut msg = String::new();
    msg.push_str("flatname: Lock file mismatch!\n\n");
    msg.push_str("  Locked tables that would be renamed:\n");
    for r in &diff.renamed {
        msg.push_str(&format!(
            "    - {}.{} ({}) -> {}\n",
            r.schema, r.locked, r.path, r.current
        ));
    }
    msg.push_str("\n  To fix:\n");
    msg.push_str("    1. Rename the newly added source field that causes the collision, OR\n");
    msg.push_str("    2. Set `on_rename = \"warn\"` in names.toml to accept renames, OR\n");
    msg.push_str("    3. Delete names.lock.toml to regenerate (BREAKING CHANGE!)\n");
    msg
}

/// Errors that can occur during generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Failed to parse names.toml
    #[error("Config error: {0}")]
    Config(#[from] NamesConfigError),
    /// Failed to read/write lock file
    #[error("Lock file error: {0}")]
    Lock(#[from] LockFileError),
    /// Names could not be resolved
    #[error("Naming error: {0}")]
    Registry(#[from] RegistryError),
    /// Lock file mismatch (tables renamed)
    #[error("{0}")]
    LockMismatch(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

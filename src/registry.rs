//! Name registry — collects one candidate name per nesting path, then repairs
//! collisions in a single deterministic pass.
//!
//! ```text
//! Building ──resolve_names()──▶ Resolved
//!    │                              (read-only)
//!    └── register() ×N
//! ```
//!
//! Collisions are only flagged while building. Repair is deferred until every
//! path is known, so the final assignment never depends on the order in which
//! paths were submitted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::destination::DestinationProfile;
use crate::error::RegistryError;
use crate::namer::PathNamer;
use crate::normalize::{IdentifierNormalizer, StandardNormalizer};
use crate::path::NestingPath;

/// Lifecycle of a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryState {
    /// Accepting registrations.
    Building,
    /// Names are final; read-only.
    Resolved,
    /// Resolution failed; the batch must be rerun with corrected input.
    Failed,
}

/// `(schema, table name)` — unique within a resolved registry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableKey {
    pub schema: String,
    pub name: String,
}

impl TableKey {
    fn new(schema: &str, name: impl Into<String>) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.into(),
        }
    }
}

/// `(schema, path)` — identity of one registered entity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    pub schema: String,
    pub path: NestingPath,
}

/// Final assignment for one entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub schema: String,
    pub table_name: String,
    /// Model file name, unique across all schemas of the destination.
    pub file_name: String,
    pub path: NestingPath,
}

/// An entity that had to be renamed during resolution.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ConflictRecord {
    pub schema: String,
    pub previous_name: String,
    pub path: NestingPath,
    pub new_name: String,
}

/// Authoritative path → table name mapping for one destination.
///
/// Create one per destination; instances share nothing.
#[derive(Clone, Debug)]
pub struct TableNameRegistry<N = StandardNormalizer> {
    namer: PathNamer<N>,
    state: RegistryState,
    /// Simple-name candidates, possibly colliding.
    candidates: BTreeMap<TableKey, BTreeSet<NestingPath>>,
    /// Candidate keys shared by more than one path.
    collisions: BTreeSet<TableKey>,
    resolved: BTreeMap<TableKey, ResolvedEntry>,
    by_entity: HashMap<EntityKey, TableKey>,
    conflicts: Vec<ConflictRecord>,
}

impl TableNameRegistry<StandardNormalizer> {
    /// Registry using [`StandardNormalizer`].
    pub fn standard(profile: impl Into<DestinationProfile>) -> Self {
        Self::with_namer(PathNamer::standard(profile))
    }
}

impl<N: IdentifierNormalizer> TableNameRegistry<N> {
    pub fn new(profile: impl Into<DestinationProfile>, normalizer: N) -> Self {
        Self::with_namer(PathNamer::new(profile, normalizer))
    }

    /// Registry around a preconfigured namer (e.g. one with a custom budget).
    pub fn with_namer(namer: PathNamer<N>) -> Self {
        Self {
            namer,
            state: RegistryState::Building,
            candidates: BTreeMap::new(),
            collisions: BTreeSet::new(),
            resolved: BTreeMap::new(),
            by_entity: HashMap::new(),
            conflicts: Vec::new(),
        }
    }

    #[inline]
    pub fn namer(&self) -> &PathNamer<N> {
        &self.namer
    }

    #[inline]
    pub fn state(&self) -> RegistryState {
        self.state
    }

    /// Number of distinct registered entities.
    pub fn len(&self) -> usize {
        self.candidates.values().map(BTreeSet::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate names currently shared by more than one path.
    pub fn pending_collisions(&self) -> impl Iterator<Item = &TableKey> {
        self.collisions.iter()
    }

    /// Record the simple-name candidate for `path` in `schema`.
    ///
    /// Registering the same `(schema, path)` twice is a no-op. A candidate
    /// already taken by a different path is flagged, not repaired; repair
    /// happens in [`resolve_names`](Self::resolve_names).
    ///
    /// # Errors
    ///
    /// - [`RegistryError::AlreadyResolved`] after resolution
    /// - [`RegistryError::Naming`] if the destination budget is unusable
    pub fn register(&mut self, schema: &str, path: NestingPath) -> Result<(), RegistryError> {
        if self.state != RegistryState::Building {
            return Err(RegistryError::AlreadyResolved);
        }

        let schema = self.namer.normalize(schema);
        let simple = self.namer.simple_name(&path)?;
        let key = TableKey::new(&schema, simple);

        tracing::debug!(schema = %key.schema, path = %path, name = %key.name, "registered path");
        let paths = self.candidates.entry(key.clone()).or_default();
        if paths.insert(path) && paths.len() > 1 && self.collisions.insert(key.clone()) {
            tracing::debug!(
                schema = %key.schema,
                name = %key.name,
                "table name candidate claimed by more than one path"
            );
        }
        Ok(())
    }

    /// [`register`](Self::register) from raw segments.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Naming`] wrapping `EmptyPath` if `segments` is empty,
    /// plus everything `register` returns.
    pub fn register_segments<I, S>(&mut self, schema: &str, segments: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = NestingPath::new(segments)?;
        self.register(schema, path)
    }

    /// Repair every collision and freeze the registry.
    ///
    /// Each path in a collision set is renamed to its hashed name. Returns one
    /// [`ConflictRecord`] per renamed entity, sorted by schema, previous name
    /// and path.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::AlreadyResolved`] on a second call
    /// - [`RegistryError::EmptyRegistry`] if nothing was registered
    /// - [`RegistryError::UnresolvedCollision`] / [`RegistryError::FileNameCollision`]
    ///   if fingerprinted names still collide
    ///
    /// Any error leaves the registry in [`RegistryState::Failed`].
    pub fn resolve_names(&mut self) -> Result<Vec<ConflictRecord>, RegistryError> {
        if self.state != RegistryState::Building {
            return Err(RegistryError::AlreadyResolved);
        }
        self.state = RegistryState::Failed;

        if self.candidates.is_empty() {
            return Err(RegistryError::EmptyRegistry);
        }

        let (assigned, conflicts) = self.assign_table_names()?;
        let file_names = self.assign_file_names(&assigned)?;

        let mut resolved = BTreeMap::new();
        let mut by_entity = HashMap::with_capacity(assigned.len());
        for ((key, path), file_name) in assigned.into_iter().zip(file_names) {
            by_entity.insert(
                EntityKey {
                    schema: key.schema.clone(),
                    path: path.clone(),
                },
                key.clone(),
            );
            let entry = ResolvedEntry {
                schema: key.schema.clone(),
                table_name: key.name.clone(),
                file_name,
                path,
            };
            resolved.insert(key, entry);
        }

        for c in &conflicts {
            tracing::warn!(
                schema = %c.schema,
                previous = %c.previous_name,
                path = %c.path,
                resolved = %c.new_name,
                "resolved table name conflict"
            );
        }

        self.resolved = resolved;
        self.by_entity = by_entity;
        self.conflicts = conflicts.clone();
        self.state = RegistryState::Resolved;
        Ok(conflicts)
    }

    /// Keep unshared simple names, rename every member of a collision set.
    #[allow(clippy::type_complexity)]
    fn assign_table_names(
        &self,
    ) -> Result<(BTreeMap<TableKey, NestingPath>, Vec<ConflictRecord>), RegistryError> {
        let mut assigned: BTreeMap<TableKey, NestingPath> = BTreeMap::new();
        for (key, paths) in &self.candidates {
            if !self.collisions.contains(key)
                && let Some(path) = paths.first()
            {
                assigned.insert(key.clone(), path.clone());
            }
        }

        // BTree iteration order makes both the result and any error independent
        // of registration order.
        let mut conflicts = Vec::new();
        for key in &self.collisions {
            for path in &self.candidates[key] {
                let hashed = self.namer.hashed_name(&key.schema, path)?;
                let new_key = TableKey::new(&key.schema, hashed);
                if let Some(existing) = assigned.get(&new_key) {
                    return Err(RegistryError::UnresolvedCollision {
                        schema: new_key.schema,
                        name: new_key.name,
                        first: existing.clone(),
                        second: path.clone(),
                    });
                }
                // A hashed name equal to the contested one is not a rename
                if new_key.name != key.name {
                    conflicts.push(ConflictRecord {
                        schema: key.schema.clone(),
                        previous_name: key.name.clone(),
                        path: path.clone(),
                        new_name: new_key.name.clone(),
                    });
                }
                assigned.insert(new_key, path.clone());
            }
        }
        conflicts.sort();
        Ok((assigned, conflicts))
    }

    /// File names, in the iteration order of `assigned`.
    ///
    /// A table name used by more than one schema gets its hashed name as file
    /// name in each of them; the fingerprint covers the schema.
    fn assign_file_names(
        &self,
        assigned: &BTreeMap<TableKey, NestingPath>,
    ) -> Result<Vec<String>, RegistryError> {
        let mut schemas_per_name: HashMap<&str, usize> = HashMap::new();
        for key in assigned.keys() {
            *schemas_per_name.entry(key.name.as_str()).or_default() += 1;
        }

        let mut file_names = Vec::with_capacity(assigned.len());
        let mut owners: BTreeMap<String, (&str, &NestingPath)> = BTreeMap::new();
        for (key, path) in assigned {
            let file_name = if schemas_per_name[key.name.as_str()] > 1 {
                self.namer.hashed_name(&key.schema, path)?
            } else {
                key.name.clone()
            };
            if let Some((schema, existing)) = owners.get(&file_name) {
                return Err(RegistryError::FileNameCollision {
                    name: file_name,
                    first_schema: schema.to_string(),
                    first: NestingPath::clone(existing),
                    second_schema: key.schema.clone(),
                    second: path.clone(),
                });
            }
            owners.insert(file_name.clone(), (key.schema.as_str(), path));
            file_names.push(file_name);
        }
        Ok(file_names)
    }

    fn ensure_resolved(&self) -> Result<(), RegistryError> {
        match self.state {
            RegistryState::Resolved => Ok(()),
            _ => Err(RegistryError::NotResolved),
        }
    }

    /// Every final assignment, ordered by schema then table name.
    pub fn entries(&self) -> Result<impl Iterator<Item = &ResolvedEntry>, RegistryError> {
        self.ensure_resolved()?;
        Ok(self.resolved.values())
    }

    /// Conflict records produced by [`resolve_names`](Self::resolve_names).
    pub fn conflicts(&self) -> Result<&[ConflictRecord], RegistryError> {
        self.ensure_resolved()?;
        Ok(&self.conflicts)
    }

    /// Table name → originating path.
    pub fn path_of(&self, schema: &str, table: &str) -> Result<Option<&NestingPath>, RegistryError> {
        self.ensure_resolved()?;
        let key = TableKey::new(&self.namer.normalize(schema), table);
        Ok(self.resolved.get(&key).map(|e| &e.path))
    }

    /// Originating path → final entry.
    pub fn entry_of(
        &self,
        schema: &str,
        path: &NestingPath,
    ) -> Result<Option<&ResolvedEntry>, RegistryError> {
        self.ensure_resolved()?;
        let entity = EntityKey {
            schema: self.namer.normalize(schema),
            path: path.clone(),
        };
        Ok(self
            .by_entity
            .get(&entity)
            .and_then(|key| self.resolved.get(key)))
    }

    /// Originating path → final table name.
    pub fn table_name_of(
        &self,
        schema: &str,
        path: &NestingPath,
    ) -> Result<Option<&str>, RegistryError> {
        Ok(self
            .entry_of(schema, path)?
            .map(|e| e.table_name.as_str()))
    }

    /// schema → table name → path.
    pub fn to_mapping(
        &self,
    ) -> Result<BTreeMap<String, BTreeMap<String, NestingPath>>, RegistryError> {
        let mut mapping: BTreeMap<String, BTreeMap<String, NestingPath>> = BTreeMap::new();
        for entry in self.entries()? {
            mapping
                .entry(entry.schema.clone())
                .or_default()
                .insert(entry.table_name.clone(), entry.path.clone());
        }
        Ok(mapping)
    }

    /// [`to_mapping`](Self::to_mapping) as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, RegistryError> {
        let mapping = self.to_mapping()?;
        serde_json::to_string_pretty(&mapping).map_err(|e| RegistryError::Serialization(e.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::Destination;
    use crate::error::NamingError;
    use crate::hash::fingerprint;

    fn path(segments: &[&str]) -> NestingPath {
        NestingPath::new(segments.iter().copied()).unwrap()
    }

    fn postgres() -> TableNameRegistry {
        TableNameRegistry::standard(Destination::Postgres)
    }

    #[test]
    fn unique_names_pass_through() {
        let mut reg = postgres();
        reg.register("public", path(&["users"])).unwrap();
        reg.register("public", path(&["users", "addresses"])).unwrap();

        let conflicts = reg.resolve_names().unwrap();
        assert!(conflicts.is_empty());
        assert_eq!(reg.state(), RegistryState::Resolved);
        assert_eq!(
            reg.table_name_of("public", &path(&["users", "addresses"])).unwrap(),
            Some("users_addresses")
        );
        assert_eq!(
            reg.path_of("public", "users").unwrap(),
            Some(&path(&["users"]))
        );
    }

    #[test]
    fn colliding_paths_get_hashed_names() {
        let nested = path(&["parent", "child"]);
        let flat = path(&["parent_child"]);

        let mut reg = postgres();
        reg.register("public", nested.clone()).unwrap();
        reg.register("public", flat.clone()).unwrap();
        assert_eq!(reg.pending_collisions().count(), 1);

        let conflicts = reg.resolve_names().unwrap();
        assert_eq!(conflicts.len(), 2);

        let nested_name = format!("parent_{}_child", fingerprint("public", &nested));
        let flat_name = format!("parent_child_{}", fingerprint("public", &flat));
        assert_eq!(reg.table_name_of("public", &nested).unwrap(), Some(nested_name.as_str()));
        assert_eq!(reg.table_name_of("public", &flat).unwrap(), Some(flat_name.as_str()));
        assert!(reg.path_of("public", "parent_child").unwrap().is_none());

        for c in &conflicts {
            assert_eq!(c.previous_name, "parent_child");
            assert_ne!(c.new_name, c.previous_name);
        }
    }

    #[test]
    fn conflict_records_are_sorted() {
        let mut reg = postgres();
        for p in [&["b_x"][..], &["b", "x"], &["a", "x"], &["a_x"]] {
            reg.register("public", path(p)).unwrap();
        }
        let conflicts = reg.resolve_names().unwrap();
        let order: Vec<(String, String)> = conflicts
            .iter()
            .map(|c| (c.previous_name.clone(), c.path.to_string()))
            .collect();
        assert_eq!(
            order,
            [
                ("a_x".to_string(), "a.x".to_string()),
                ("a_x".to_string(), "a_x".to_string()),
                ("b_x".to_string(), "b.x".to_string()),
                ("b_x".to_string(), "b_x".to_string()),
            ]
        );
    }

    #[test]
    fn same_path_twice_is_not_a_collision() {
        let mut reg = postgres();
        reg.register("public", path(&["users"])).unwrap();
        reg.register("public", path(&["users"])).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(reg.resolve_names().unwrap().is_empty());
    }

    #[test]
    fn schemas_are_independent_namespaces() {
        let mut reg = postgres();
        reg.register("one", path(&["users"])).unwrap();
        reg.register("two", path(&["users"])).unwrap();
        assert!(reg.resolve_names().unwrap().is_empty());

        assert_eq!(reg.table_name_of("one", &path(&["users"])).unwrap(), Some("users"));
        assert_eq!(reg.table_name_of("two", &path(&["users"])).unwrap(), Some("users"));
    }

    #[test]
    fn shared_table_names_get_distinct_file_names() {
        let mut reg = postgres();
        reg.register("one", path(&["users"])).unwrap();
        reg.register("two", path(&["users"])).unwrap();
        reg.register("two", path(&["orders"])).unwrap();
        reg.resolve_names().unwrap();

        let one = reg.entry_of("one", &path(&["users"])).unwrap().unwrap();
        let two = reg.entry_of("two", &path(&["users"])).unwrap().unwrap();
        assert_eq!(one.file_name, format!("users_{}", fingerprint("one", &path(&["users"]))));
        assert_eq!(two.file_name, format!("users_{}", fingerprint("two", &path(&["users"]))));
        assert_ne!(one.file_name, two.file_name);

        let orders = reg.entry_of("two", &path(&["orders"])).unwrap().unwrap();
        assert_eq!(orders.file_name, "orders");
    }

    #[test]
    fn schema_names_are_normalized() {
        let mut reg = postgres();
        reg.register("My Schema", path(&["users"])).unwrap();
        reg.resolve_names().unwrap();
        let entry = reg.entry_of("My Schema", &path(&["users"])).unwrap().unwrap();
        assert_eq!(entry.schema, "my_schema");
        assert!(reg.to_mapping().unwrap().contains_key("my_schema"));
    }

    #[test]
    fn register_after_resolve_fails() {
        let mut reg = postgres();
        reg.register("public", path(&["users"])).unwrap();
        reg.resolve_names().unwrap();
        assert_eq!(
            reg.register("public", path(&["orders"])),
            Err(RegistryError::AlreadyResolved)
        );
    }

    #[test]
    fn resolve_twice_fails() {
        let mut reg = postgres();
        reg.register("public", path(&["users"])).unwrap();
        reg.resolve_names().unwrap();
        assert_eq!(reg.resolve_names(), Err(RegistryError::AlreadyResolved));
    }

    #[test]
    fn resolve_empty_registry_fails() {
        let mut reg = postgres();
        assert_eq!(reg.resolve_names(), Err(RegistryError::EmptyRegistry));
        assert_eq!(reg.state(), RegistryState::Failed);
        assert_eq!(reg.resolve_names(), Err(RegistryError::AlreadyResolved));
    }

    #[test]
    fn reads_before_resolution_fail() {
        let mut reg = postgres();
        reg.register("public", path(&["users"])).unwrap();
        assert!(matches!(reg.entries(), Err(RegistryError::NotResolved)));
        assert_eq!(reg.conflicts(), Err(RegistryError::NotResolved));
        assert_eq!(reg.to_json(), Err(RegistryError::NotResolved));
    }

    #[test]
    fn empty_segments_are_rejected() {
        let mut reg = postgres();
        let none: Vec<String> = Vec::new();
        assert_eq!(
            reg.register_segments("public", none),
            Err(RegistryError::Naming(NamingError::EmptyPath))
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn unusable_budget_fails_at_register() {
        let mut reg = TableNameRegistry::with_namer(
            PathNamer::standard(Destination::Postgres).with_budget(2),
        );
        assert!(matches!(
            reg.register("public", path(&["users"])),
            Err(RegistryError::Naming(NamingError::BudgetTooSmall { budget: 2, .. }))
        ));
    }

    #[test]
    fn hashed_name_clashing_with_simple_name_is_unresolved() {
        let nested = path(&["parent", "child"]);
        let flat = path(&["parent_child"]);
        let squatter_name = format!("parent_{}_child", fingerprint("public", &nested));

        let mut reg = postgres();
        reg.register("public", nested.clone()).unwrap();
        reg.register("public", flat).unwrap();
        // A stream literally named after the hashed name it would be given
        reg.register("public", path(&[squatter_name.as_str()])).unwrap();

        match reg.resolve_names() {
            Err(RegistryError::UnresolvedCollision { schema, name, first, second }) => {
                assert_eq!(schema, "public");
                assert_eq!(name, squatter_name);
                assert_eq!(first, path(&[squatter_name.as_str()]));
                assert_eq!(second, nested);
            }
            other => panic!("expected UnresolvedCollision, got {other:?}"),
        }
        assert_eq!(reg.state(), RegistryState::Failed);
        assert!(reg.entries().is_err());
    }

    #[test]
    fn tight_budget_collision_resolves_through_fingerprints() {
        let a = path(&["pppppppppppppppppppp", "aa_bbbbbbbb"]);
        let b = path(&["pppppppppppppppppppp_aa", "bbbbbbbb"]);
        let c = path(&["a_rather_long_parent", "x_child"]);
        let d = path(&["a_rather_long_parent_x", "child"]);

        let mut reg = TableNameRegistry::with_namer(
            PathNamer::standard(Destination::Postgres).with_budget(18),
        );
        for p in [&a, &b, &c, &d] {
            reg.register("s", p.clone()).unwrap();
        }
        assert_eq!(reg.pending_collisions().count(), 2);

        let conflicts = reg.resolve_names().unwrap();
        assert_eq!(conflicts.len(), 4);
        for record in &conflicts {
            assert_ne!(record.new_name, record.previous_name);
            assert!(record.new_name.contains(&fingerprint("s", &record.path)));
            assert!(record.new_name.chars().count() <= 18);
        }
        assert_eq!(
            reg.table_name_of("s", &c).unwrap(),
            Some(format!("a_rath_{}_x_child", fingerprint("s", &c)).as_str())
        );
        assert_eq!(
            reg.table_name_of("s", &d).unwrap(),
            Some(format!("a_rather_{}_child", fingerprint("s", &d)).as_str())
        );
    }

    #[test]
    fn json_maps_schema_to_table_to_path() {
        let mut reg = postgres();
        reg.register("public", path(&["users"])).unwrap();
        reg.register("public", path(&["users", "tags"])).unwrap();
        reg.resolve_names().unwrap();

        let json: serde_json::Value = serde_json::from_str(&reg.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "public": {
                    "users": ["users"],
                    "users_tags": ["users", "tags"],
                }
            })
        );
    }
}

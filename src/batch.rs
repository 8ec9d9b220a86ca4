//! Naming the same schema for several destinations at once.
//!
//! Each destination gets its own registry, so the work is split across
//! scoped threads without any shared mutable state.

use std::thread;

use crate::destination::DestinationProfile;
use crate::error::RegistryError;
use crate::path::NestingPath;
use crate::registry::{ConflictRecord, TableNameRegistry};

/// A `(schema, path)` pair as discovered by a schema walker.
pub type Registration = (String, NestingPath);

/// Outcome of naming one destination.
#[derive(Debug)]
pub struct DestinationNames {
    pub profile: DestinationProfile,
    pub result: Result<(TableNameRegistry, Vec<ConflictRecord>), RegistryError>,
}

/// Register and resolve `registrations` once per profile, in parallel.
///
/// Results come back in the order of `profiles`.
pub fn resolve_for_destinations(
    profiles: &[DestinationProfile],
    registrations: &[Registration],
) -> Vec<DestinationNames> {
    thread::scope(|scope| {
        let handles: Vec<_> = profiles
            .iter()
            .map(|&profile| {
                (
                    profile,
                    scope.spawn(move || resolve_one(profile, registrations)),
                )
            })
            .collect();

        handles
            .into_iter()
            .map(|(profile, handle)| DestinationNames {
                profile,
                // A panicking worker is a bug in the namer itself
                result: handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
            })
            .collect()
    })
}

/// Name one destination on the current thread.
pub fn resolve_one(
    profile: DestinationProfile,
    registrations: &[Registration],
) -> Result<(TableNameRegistry, Vec<ConflictRecord>), RegistryError> {
    let mut registry = TableNameRegistry::standard(profile);
    for (schema, path) in registrations {
        registry.register(schema, path.clone())?;
    }
    let conflicts = registry.resolve_names()?;
    Ok((registry, conflicts))
}

//! # Flat table names for nested schemas (flatname)
//!
//! Turns every record/array level of a nested schema into a table name that
//! fits a destination's identifier rules and is unique within its schema.
//!
//! ## Design
//!
//! Each level is identified by its [`NestingPath`], the root-to-leaf chain of
//! raw field and stream names. Naming happens in two phases:
//!
//! ```text
//!  walker ──register(schema, path)──▶ TableNameRegistry ──resolve_names()──▶ final names
//!                                        │                                 + ConflictRecords
//!                                        └─ PathNamer::simple_name (may collide)
//!                                                   │ on collision
//!                                                   ▼
//!                                           PathNamer::hashed_name (parent_<fp>_leaf)
//! ```
//!
//! The registry is built once per destination, because casing and length
//! limits differ between destinations.
//!
//! ```
//! use flatname::{Destination, NestingPath, TableNameRegistry};
//!
//! let mut registry = TableNameRegistry::standard(Destination::Postgres);
//! registry.register("public", NestingPath::new(["users"])?)?;
//! registry.register("public", NestingPath::new(["users", "addresses"])?)?;
//! let conflicts = registry.resolve_names()?;
//!
//! assert!(conflicts.is_empty());
//! let addresses = NestingPath::new(["users", "addresses"])?;
//! assert_eq!(registry.table_name_of("public", &addresses)?, Some("users_addresses"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod destination;
pub mod error;
pub mod hash;
pub mod namer;
pub mod normalize;
pub mod path;
pub mod registry;

pub use batch::{resolve_for_destinations, DestinationNames, Registration};
pub use destination::{Destination, DestinationProfile, UnknownDestination, RESERVED_HEADROOM};
pub use error::{NamingError, RegistryError};
pub use hash::{fingerprint, fnv1a_64, FINGERPRINT_LEN};
pub use namer::{fit_to_budget, PathNamer, ELISION_MARKER, MIN_BUDGET, MIN_ELIDED_LEN};
pub use normalize::{Casing, IdentifierNormalizer, StandardNormalizer};
pub use path::NestingPath;
pub use registry::{ConflictRecord, RegistryState, ResolvedEntry, TableKey, TableNameRegistry};

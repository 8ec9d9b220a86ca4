//! Error taxonomy for naming and registry resolution.
//!
//! Every error here is a deterministic function of the input schema and the
//! destination profile. Retrying with the same input yields the same error.

use crate::path::NestingPath;

/// Failures of the pure naming functions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    /// The destination's naming budget cannot hold a head, the elision marker and a tail.
    #[error(
        "naming budget of {budget} characters is below the minimum viable width of {minimum}; \
         check the destination profile"
    )]
    BudgetTooSmall { budget: usize, minimum: usize },

    /// A nesting path must name at least a leaf.
    #[error("nesting path must contain at least one segment")]
    EmptyPath,
}

/// Failures of the name registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Naming(#[from] NamingError),

    /// Two distinct paths still share a name after fingerprinted renaming.
    #[error(
        "unresolved name collision in schema '{schema}': '{first}' and '{second}' both map to \
         '{name}'; rename one of the source fields"
    )]
    UnresolvedCollision {
        schema: String,
        name: String,
        first: NestingPath,
        second: NestingPath,
    },

    /// Two tables in different schemas still share a model file name.
    #[error(
        "unresolved file name collision on '{name}': '{first_schema}.{first}' and \
         '{second_schema}.{second}'"
    )]
    FileNameCollision {
        name: String,
        first_schema: String,
        first: NestingPath,
        second_schema: String,
        second: NestingPath,
    },

    #[error("failed to serialize resolved names: {0}")]
    Serialization(String),

    #[error("registry already resolved; no further registrations or resolutions are allowed")]
    AlreadyResolved,

    #[error("registry has not been resolved yet")]
    NotResolved,

    #[error("cannot resolve names: no paths were registered")]
    EmptyRegistry,
}

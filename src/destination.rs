//! Destination identities and their naming budgets.
//!
//! A naming budget is the destination's raw identifier limit minus a fixed
//! headroom reserved for suffixes appended by downstream table materialization.
//! The headroom constants are external policy and must stay as they are for
//! compatibility with already-generated schemas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Characters reserved for suffixes the materialization layer appends to models.
pub const MATERIALIZATION_RESERVED_LEN: usize = 12;

/// Characters reserved for an `_xyz` step suffix plus an `_xyz` schema hash.
pub const SUFFIX_RESERVED_LEN: usize = 8;

/// Total headroom subtracted from a raw identifier limit.
pub const RESERVED_HEADROOM: usize = MATERIALIZATION_RESERVED_LEN + SUFFIX_RESERVED_LEN;

/// Supported target destinations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Postgres,
    BigQuery,
    Redshift,
    Snowflake,
    MySql,
    Oracle,
    MsSql,
    ClickHouse,
    TiDb,
}

impl Destination {
    pub const ALL: [Destination; 9] = [
        Destination::Postgres,
        Destination::BigQuery,
        Destination::Redshift,
        Destination::Snowflake,
        Destination::MySql,
        Destination::Oracle,
        Destination::MsSql,
        Destination::ClickHouse,
        Destination::TiDb,
    ];

    /// Native maximum identifier length of the destination.
    pub const fn identifier_limit(self) -> usize {
        match self {
            Destination::Postgres => 63,
            Destination::BigQuery => 1024,
            Destination::Redshift => 127,
            Destination::Snowflake => 255,
            Destination::MySql => 64,
            Destination::Oracle => 128,
            Destination::MsSql => 64,
            Destination::ClickHouse => 63,
            Destination::TiDb => 64,
        }
    }

    /// Lowercase name used in configuration files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Destination::Postgres => "postgres",
            Destination::BigQuery => "bigquery",
            Destination::Redshift => "redshift",
            Destination::Snowflake => "snowflake",
            Destination::MySql => "mysql",
            Destination::Oracle => "oracle",
            Destination::MsSql => "mssql",
            Destination::ClickHouse => "clickhouse",
            Destination::TiDb => "tidb",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a destination name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown destination '{0}'")]
pub struct UnknownDestination(pub String);

impl FromStr for Destination {
    type Err = UnknownDestination;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Destination::ALL
            .into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| UnknownDestination(s.to_string()))
    }
}

/// Everything the namer needs to know about one target destination.
///
/// Constant for the lifetime of a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DestinationProfile {
    destination: Destination,
    identifier_limit: usize,
}

impl DestinationProfile {
    /// Profile using the destination's native identifier limit.
    pub const fn new(destination: Destination) -> Self {
        Self {
            destination,
            identifier_limit: destination.identifier_limit(),
        }
    }

    /// Override the raw identifier limit (e.g. a server built with a custom `NAMEDATALEN`).
    pub const fn with_identifier_limit(mut self, limit: usize) -> Self {
        self.identifier_limit = limit;
        self
    }

    #[inline]
    pub const fn destination(&self) -> Destination {
        self.destination
    }

    #[inline]
    pub const fn identifier_limit(&self) -> usize {
        self.identifier_limit
    }

    /// Maximum characters a generated table name may occupy.
    ///
    /// Saturates at zero; undersized budgets are rejected by the namer.
    #[inline]
    pub const fn naming_budget(&self) -> usize {
        self.identifier_limit.saturating_sub(RESERVED_HEADROOM)
    }
}

impl From<Destination> for DestinationProfile {
    fn from(destination: Destination) -> Self {
        Self::new(destination)
    }
}

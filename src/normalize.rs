//! Identifier normalization capability.
//!
//! The namer never decides casing or character rules itself; it asks an
//! [`IdentifierNormalizer`] for the destination at hand.

use crate::destination::Destination;

/// Destination-specific character substitution, casing and hard truncation.
///
/// Implementations must be pure and deterministic, and must never return a
/// string longer than `max_len` characters.
pub trait IdentifierNormalizer: Send + Sync {
    fn normalize(&self, destination: Destination, raw: &str, max_len: usize) -> String;
}

impl<N: IdentifierNormalizer + ?Sized> IdentifierNormalizer for &N {
    fn normalize(&self, destination: Destination, raw: &str, max_len: usize) -> String {
        (**self).normalize(destination, raw, max_len)
    }
}

/// How a destination folds unquoted identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Casing {
    Lower,
    Upper,
    Preserve,
}

impl Casing {
    pub const fn of(destination: Destination) -> Self {
        match destination {
            Destination::Postgres | Destination::Redshift => Casing::Lower,
            Destination::Snowflake => Casing::Upper,
            _ => Casing::Preserve,
        }
    }
}

/// Default normalizer: ASCII word characters only, destination casing.
///
/// ```
/// use flatname::{Destination, IdentifierNormalizer, StandardNormalizer};
///
/// let n = StandardNormalizer;
/// assert_eq!(n.normalize(Destination::Postgres, "Café Orders", usize::MAX), "cafe_orders");
/// assert_eq!(n.normalize(Destination::Snowflake, "line-items", usize::MAX), "LINE_ITEMS");
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardNormalizer;

impl IdentifierNormalizer for StandardNormalizer {
    fn normalize(&self, destination: Destination, raw: &str, max_len: usize) -> String {
        let ascii = deunicode::deunicode(raw.trim());

        let mut out = String::with_capacity(ascii.len());
        let mut in_whitespace = false;
        for ch in ascii.chars() {
            if ch.is_whitespace() {
                if !in_whitespace {
                    out.push('_');
                }
                in_whitespace = true;
                continue;
            }
            in_whitespace = false;
            let mapped = if ch.is_ascii_alphanumeric() || ch == '_' {
                ch
            } else {
                '_'
            };
            out.push(match Casing::of(destination) {
                Casing::Lower => mapped.to_ascii_lowercase(),
                Casing::Upper => mapped.to_ascii_uppercase(),
                Casing::Preserve => mapped,
            });
        }

        if out.is_empty() {
            out.push('_');
        }
        if destination != Destination::BigQuery
            && out.as_bytes().first().is_some_and(|b| b.is_ascii_digit())
        {
            out.insert(0, '_');
        }

        // Output is pure ASCII here, so byte and char lengths agree.
        out.truncate(max_len);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pg(raw: &str) -> String {
        StandardNormalizer.normalize(Destination::Postgres, raw, usize::MAX)
    }

    #[test]
    fn replaces_invalid_characters() {
        assert_eq!(pg("a-b.c$d"), "a_b_c_d");
        assert_eq!(pg("  padded  "), "padded");
        assert_eq!(pg("tab\tand  spaces"), "tab_and_spaces");
    }

    #[test]
    fn strips_accents() {
        assert_eq!(pg("Écoles"), "ecoles");
        assert_eq!(pg("naïve"), "naive");
    }

    #[test]
    fn applies_destination_casing() {
        let n = StandardNormalizer;
        assert_eq!(n.normalize(Destination::Postgres, "Parent", usize::MAX), "parent");
        assert_eq!(n.normalize(Destination::Redshift, "Parent", usize::MAX), "parent");
        assert_eq!(n.normalize(Destination::Snowflake, "Parent", usize::MAX), "PARENT");
        assert_eq!(n.normalize(Destination::BigQuery, "Parent", usize::MAX), "Parent");
        assert_eq!(n.normalize(Destination::MySql, "Parent", usize::MAX), "Parent");
    }

    #[test]
    fn leading_digit_is_prefixed_except_on_bigquery() {
        assert_eq!(pg("1st_stream"), "_1st_stream");
        assert_eq!(
            StandardNormalizer.normalize(Destination::BigQuery, "1st_stream", usize::MAX),
            "1st_stream"
        );
    }

    #[test]
    fn empty_input_becomes_underscore() {
        assert_eq!(pg(""), "_");
        assert_eq!(pg("   "), "_");
    }

    #[test]
    fn never_exceeds_max_len() {
        let n = StandardNormalizer;
        assert_eq!(n.normalize(Destination::Postgres, "abcdefgh", 3), "abc");
        for len in 0..10 {
            assert!(n.normalize(Destination::Postgres, "Some Long Stream Name", len).len() <= len);
        }
    }
}

//! Path namer — readable, budget-fitted table names derived from nesting paths.
//!
//! Two candidates exist for every path:
//!
//! - the *simple* name joins every segment and elides the middle when too long;
//! - the *hashed* name inserts a fingerprint of the full path between parent and
//!   leaf, and is only used once the simple name is known to collide.
//!
//! ```text
//! simple:  the_parent_stream_ha___short_substream_name   (head + "__" + tail)
//! hashed:  the_parent_stream__3f1_short_substream_name   (parent + fp + leaf)
//! ```

use crate::destination::{Destination, DestinationProfile};
use crate::error::NamingError;
use crate::hash::{fingerprint, FINGERPRINT_LEN};
use crate::normalize::{IdentifierNormalizer, StandardNormalizer};
use crate::path::NestingPath;

/// Joins path segments and name parts.
pub const SEPARATOR: &str = "_";

/// Marks the spot where the middle of a name was cut out.
pub const ELISION_MARKER: &str = "__";

/// Smallest width [`fit_to_budget`] can elide into: one head character, the
/// marker and one tail character.
pub const MIN_ELIDED_LEN: usize = ELISION_MARKER.len() + 2;

/// Smallest naming budget: one parent character, `_<fp>_` and one leaf
/// character. Every accepted budget keeps the fingerprint of a hashed name.
pub const MIN_BUDGET: usize = FINGERPRINT_LEN + 2 * SEPARATOR.len() + 2;

/// Parent characters a hashed name keeps before it starts eliding the leaf.
pub const MIN_PARENT_LEN: usize = 10;

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn head(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn tail(s: &str, n: usize) -> String {
    let skip = char_len(s).saturating_sub(n);
    s.chars().skip(skip).collect()
}

fn check_budget(budget: usize, minimum: usize) -> Result<(), NamingError> {
    if budget < minimum {
        return Err(NamingError::BudgetTooSmall { budget, minimum });
    }
    Ok(())
}

/// Elide the middle of `s` when there is room for the marker, otherwise keep
/// its first `n` characters.
fn shorten(s: &str, n: usize) -> Result<String, NamingError> {
    if n >= MIN_ELIDED_LEN {
        fit_to_budget(s, n)
    } else {
        Ok(head(s, n))
    }
}

/// Fit `name` into `budget` characters by eliding its middle.
///
/// Names that already fit are returned unchanged. Otherwise the result is
/// exactly `budget` characters: a prefix, [`ELISION_MARKER`], and a suffix.
/// When the room left for prefix and suffix is odd, the suffix gets the extra
/// character, since the end of a name carries the leaf.
///
/// # Errors
///
/// [`NamingError::BudgetTooSmall`] if `budget < MIN_ELIDED_LEN`.
pub fn fit_to_budget(name: &str, budget: usize) -> Result<String, NamingError> {
    check_budget(budget, MIN_ELIDED_LEN)?;
    if char_len(name) <= budget {
        return Ok(name.to_string());
    }
    let available = budget - ELISION_MARKER.len();
    let tail_len = available.div_ceil(2);
    let head_len = available - tail_len;
    Ok(format!(
        "{}{ELISION_MARKER}{}",
        head(name, head_len),
        tail(name, tail_len)
    ))
}

/// Derives candidate table names for one destination.
///
/// Stateless apart from its configuration: the same input always produces
/// the same name, whatever else has been named before.
#[derive(Clone, Debug)]
pub struct PathNamer<N = StandardNormalizer> {
    destination: Destination,
    budget: usize,
    normalizer: N,
}

impl PathNamer<StandardNormalizer> {
    /// Namer using [`StandardNormalizer`].
    pub fn standard(profile: impl Into<DestinationProfile>) -> Self {
        Self::new(profile, StandardNormalizer)
    }
}

impl<N: IdentifierNormalizer> PathNamer<N> {
    pub fn new(profile: impl Into<DestinationProfile>, normalizer: N) -> Self {
        let profile = profile.into();
        Self {
            destination: profile.destination(),
            budget: profile.naming_budget(),
            normalizer,
        }
    }

    /// Replace the budget derived from the profile.
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    #[inline]
    pub fn budget(&self) -> usize {
        self.budget
    }

    #[inline]
    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Normalize without a length limit.
    pub fn normalize(&self, raw: &str) -> String {
        self.normalizer.normalize(self.destination, raw, usize::MAX)
    }

    /// Readable name: every segment joined, middle elided if too long.
    ///
    /// # Errors
    ///
    /// [`NamingError::BudgetTooSmall`] if the budget is below [`MIN_BUDGET`],
    /// even when this particular name would fit.
    pub fn simple_name(&self, path: &NestingPath) -> Result<String, NamingError> {
        check_budget(self.budget, MIN_BUDGET)?;
        let full = self.normalize(&path.segments().join(SEPARATOR));
        fit_to_budget(&full, self.budget)
    }

    /// Collision-breaking name: `parent_<fp>_leaf`, where `fp` fingerprints the
    /// schema and the whole path.
    ///
    /// When too long, the parent is cut first (down to [`MIN_PARENT_LEN`]
    /// characters), then the leaf is middle-elided. Below that, parent and leaf
    /// share what is left. Root paths have no parent and become `leaf_<fp>`.
    /// The fingerprint and its separators are never cut.
    ///
    /// # Errors
    ///
    /// [`NamingError::BudgetTooSmall`] if the budget is below [`MIN_BUDGET`].
    pub fn hashed_name(&self, schema: &str, path: &NestingPath) -> Result<String, NamingError> {
        check_budget(self.budget, MIN_BUDGET)?;
        let fp = fingerprint(schema, path);

        let candidate = if path.is_root() {
            let leaf = self.normalize(path.leaf());
            let room = self.budget - FINGERPRINT_LEN - SEPARATOR.len();
            format!("{}{SEPARATOR}{fp}", shorten(&leaf, room)?)
        } else {
            let parent = self.normalize(&path.parent().join(SEPARATOR));
            let child = self.normalize(path.leaf());
            let room = self.budget - FINGERPRINT_LEN - 2 * SEPARATOR.len();
            let parent_len = char_len(&parent);
            let child_len = char_len(&child);
            let min_parent = MIN_PARENT_LEN.min(parent_len);

            let (parent, child) = if parent_len + child_len <= room {
                (parent, child)
            } else if min_parent + child_len <= room {
                // Only the parent has to give way
                (head(&parent, room - child_len), child)
            } else if min_parent + MIN_ELIDED_LEN <= room {
                (head(&parent, min_parent), fit_to_budget(&child, room - min_parent)?)
            } else {
                let child_room = room.div_ceil(2).max(room.saturating_sub(parent_len));
                let child = shorten(&child, child_room)?;
                (head(&parent, room - char_len(&child)), child)
            };
            format!("{parent}{SEPARATOR}{fp}{SEPARATOR}{child}")
        };

        // Casing of the fingerprint follows the destination.
        Ok(self.normalize(&candidate))
    }
}

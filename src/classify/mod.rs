//! Tier classification of percentage returns.
//!
//! Two independent policies bucket the same number differently:
//! - [`roast::RoastTier`]: seven tiers used to pick a roast line
//! - [`meme::MemeBand`]: three bands used to pick a meme template
//!
//! Random picks inside a tier take the RNG as a parameter so callers
//! (and tests) control determinism.

pub mod meme;
pub mod roast;

use std::fmt;

/// A classification policy: a fixed, ordered set of buckets over percentage return.
///
/// Every finite input maps to exactly one bucket.
pub trait Tier: Copy + Eq + fmt::Display + Sized + 'static {
    /// All buckets, ordered from worst to best return.
    const ALL: &'static [Self];

    /// Bucket for a percentage return.
    fn classify(percentage_return: f64) -> Self;

    /// Stable lowercase name (used in JSON responses).
    fn name(&self) -> &'static str;
}

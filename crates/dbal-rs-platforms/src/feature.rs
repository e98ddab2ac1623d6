//! Optional platform capabilities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A capability flag a platform may support.
///
/// Flags are plain bits so backends can define their own with
/// [`Feature::new`] next to the built-in ones.
///
/// ```
/// use dbal_rs_platforms::Feature;
///
/// assert_eq!(Feature::MULTI_COLUMN_IN.bits(), 1);
/// assert_eq!(Feature::QUERY_EXPLAIN.bits(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Feature(u32);

impl Feature {
    /// `(a, b) IN ((1, 2), (3, 4))` comparisons.
    pub const MULTI_COLUMN_IN: Self = Self(1);
    /// `EXPLAIN` output for executed queries.
    pub const QUERY_EXPLAIN: Self = Self(2);

    /// Defines a feature flag.
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the flag value.
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MULTI_COLUMN_IN => write!(f, "multi-column IN"),
            Self::QUERY_EXPLAIN => write!(f, "query explain"),
            Self(bits) => write!(f, "feature {bits}"),
        }
    }
}

//! Semantic unit types for the rating pipeline
//!
//! Newtype wrappers keep deficit depths and percentile ranks from being mixed
//! up with each other or with raw ignition proportions.
//!
//! # Design
//! - Both types wrap `f64`; calibration exponents reach `e^445` at the top of
//!   the percentile scale, well inside `f64` range
//! - Total ordering via `Ord` (NaN sorts above every value)
//! - Private inner fields with validated constructors
//!
//! # Usage
//! ```
//! use fire_ignition_core::core_types::units::{Millimeters, Percentile};
//!
//! let deficit = Millimeters::new(35.0);
//! assert_eq!(*deficit, 35.0);
//!
//! let p = Percentile::from_fraction(3, 4);
//! assert_eq!(*p, 75.0);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

// ============================================================================
// WATER BALANCE DEPTH
// ============================================================================

/// Water-balance depth in millimeters (deficit, moving average)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Millimeters(f64);

impl Eq for Millimeters {}

impl PartialOrd for Millimeters {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Millimeters {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Millimeters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Millimeters {
    /// Create a new depth. Asserts the value is finite.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn new(value: f64) -> Self {
        assert!(value.is_finite(), "Millimeters::new: value must be finite");
        Millimeters(value)
    }

    /// Create a depth from a possibly missing or unparseable reading.
    ///
    /// Non-finite readings come back as `None`, the same as a missing value.
    #[inline]
    #[must_use]
    pub fn from_reading(value: Option<f64>) -> Option<Self> {
        value.filter(|v| v.is_finite()).map(Millimeters)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Millimeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} mm", self.0)
    }
}

// ============================================================================
// PERCENTILE RANK
// ============================================================================

/// Empirical percentile rank on the 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Percentile(f64);

impl Eq for Percentile {}

impl PartialOrd for Percentile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Percentile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Percentile {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Percentile {
    /// Lowest rank
    pub const MIN: Percentile = Percentile(0.0);

    /// Highest rank
    pub const MAX: Percentile = Percentile(100.0);

    /// Create a new percentile. Asserts value is within `[0, 100]`.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn new(value: f64) -> Self {
        assert!(
            (0.0..=100.0).contains(&value),
            "Percentile::new: value must be within [0, 100]"
        );
        Percentile(value)
    }

    /// Rank of `below` observations out of `total`, scaled to 0-100.
    ///
    /// Computed as `below / total * 100` so results match the calibration
    /// tables exactly. Caller guarantees `below <= total` and `total > 0`.
    #[inline]
    #[must_use]
    pub fn from_fraction(below: usize, total: usize) -> Self {
        debug_assert!(total > 0 && below <= total);
        Percentile(below as f64 / total as f64 * 100.0)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

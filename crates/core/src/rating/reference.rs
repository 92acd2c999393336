//! Seasonal reference distribution
//!
//! The reference distribution is the multiset of historical deficit readings
//! that fall inside a cover type's fire season and the reference calendar
//! period. It is built once per run per cover type and never mutated, so a
//! single distribution can rate any number of candidate series.

use crate::config::{FireSeasonWindow, ReferencePeriod};
use crate::core_types::cover::CoverType;
use crate::core_types::records::DeficitSeries;
use crate::error::Result;
use tracing::debug;

/// Immutable empirical distribution of fire-season deficit readings
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDistribution {
    cover_type: CoverType,
    /// Non-null readings in ascending order
    sorted: Vec<f64>,
    /// Rows that matched the season and period but had no reading
    missing: usize,
}

impl ReferenceDistribution {
    /// Build directly from readings (used for externally supplied references).
    ///
    /// Non-finite and missing values are excluded from the distribution.
    pub fn from_values(
        cover_type: CoverType,
        values: impl IntoIterator<Item = Option<f64>>,
    ) -> Self {
        let mut sorted = Vec::new();
        let mut missing = 0;
        for value in values {
            match value.filter(|v| v.is_finite()) {
                Some(v) => sorted.push(v),
                None => missing += 1,
            }
        }
        sorted.sort_by(f64::total_cmp);
        Self {
            cover_type,
            sorted,
            missing,
        }
    }

    pub fn cover_type(&self) -> CoverType {
        self.cover_type
    }

    /// Number of readings the percentile is computed against
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// In-window rows excluded because their reading was missing
    pub fn missing(&self) -> usize {
        self.missing
    }

    /// Readings in ascending order
    pub fn values(&self) -> &[f64] {
        &self.sorted
    }

    /// Count of readings strictly less than `value`.
    ///
    /// Binary search over the sorted readings gives the same count as a
    /// linear scan; ties with `value` are not counted.
    pub fn count_below(&self, value: f64) -> usize {
        self.sorted.partition_point(|&v| v < value)
    }

    pub fn min(&self) -> Option<f64> {
        self.sorted.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.sorted.last().copied()
    }
}

/// Extracts a cover type's reference distribution from a historical series
#[derive(Debug, Clone, Copy)]
pub struct SeasonalReferenceBuilder {
    season: FireSeasonWindow,
    period: ReferencePeriod,
}

impl SeasonalReferenceBuilder {
    /// Fails with a configuration error if the season window or the
    /// reference period is inverted.
    pub fn new(season: FireSeasonWindow, period: ReferencePeriod) -> Result<Self> {
        season.validate()?;
        period.validate()?;
        Ok(Self { season, period })
    }

    /// Filter `history` down to the fire season and reference period.
    ///
    /// Returns an empty distribution when nothing matches; the rater rejects
    /// empty distributions.
    pub fn build(&self, history: &DeficitSeries, cover_type: CoverType) -> ReferenceDistribution {
        let in_window = history
            .records()
            .iter()
            .filter(|r| self.season.contains(r.day_of_year()))
            .filter(|r| self.period.contains(r.date))
            .map(|r| r.deficit.map(|d| d.value()));

        let distribution = ReferenceDistribution::from_values(cover_type, in_window);
        debug!(
            "Reference distribution for {} at {}: {} readings ({} missing), DOY {}..{}, {}..={}",
            cover_type,
            history.site_id(),
            distribution.len(),
            distribution.missing(),
            self.season.start_doy,
            self.season.end_doy,
            self.period.start,
            self.period.end
        );
        distribution
    }
}

//! Percentile rank and ignition-proportion rating
//!
//! Each smoothed value is ranked against a cover type's reference
//! distribution with a strict-less-than empirical CDF:
//!
//! ```text
//! p = 100 × #{reference < v} / |reference|
//! ```
//!
//! and the rank is mapped through the cover type's calibrated exponential
//! curve `f(p) = a × exp(b × p)`, with `p` on the 0-100 scale.

use crate::core_types::cover::{CoverType, ModelParameters, ModelVersion};
use crate::core_types::records::{RatedRecord, RatedSeries, Rating, SmoothedSeries};
use crate::core_types::units::Percentile;
use crate::error::{IgnitionError, Result, Stage};
use crate::rating::reference::ReferenceDistribution;
use tracing::debug;

/// Calibrated exponential ignition-proportion curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IgnitionCurve {
    coefficient: f64,
    exponent: f64,
}

impl IgnitionCurve {
    pub fn for_model(cover_type: CoverType, version: ModelVersion) -> Self {
        let params = ModelParameters::lookup(cover_type, version);
        Self {
            coefficient: params.coefficient,
            exponent: params.exponent,
        }
    }

    /// Modelled ignition proportion at percentile `p`
    #[must_use]
    pub fn evaluate(&self, p: Percentile) -> f64 {
        self.coefficient * (self.exponent * *p).exp()
    }
}

/// Rates smoothed series against one reference distribution
#[derive(Debug, Clone, Copy)]
pub struct PercentileRater<'a> {
    reference: &'a ReferenceDistribution,
    curve: IgnitionCurve,
}

impl<'a> PercentileRater<'a> {
    /// Fails with a data error when the reference distribution is empty.
    ///
    /// The curve is chosen from the reference's cover type.
    pub fn new(reference: &'a ReferenceDistribution, version: ModelVersion) -> Result<Self> {
        if reference.is_empty() {
            return Err(IgnitionError::data(
                Stage::Rating,
                format!(
                    "{} reference distribution is empty: no readings in the season and period",
                    reference.cover_type()
                ),
            ));
        }
        Ok(Self {
            reference,
            curve: IgnitionCurve::for_model(reference.cover_type(), version),
        })
    }

    pub fn cover_type(&self) -> CoverType {
        self.reference.cover_type()
    }

    /// Empirical percentile of `value` in the reference distribution
    pub fn percentile(&self, value: f64) -> Result<Percentile> {
        let total = self.reference.len();
        if total == 0 {
            return Err(IgnitionError::computation(
                Stage::Rating,
                "percentile against a zero-size reference distribution",
            ));
        }
        Ok(Percentile::from_fraction(self.reference.count_below(value), total))
    }

    /// Percentile and ignition proportion for one value
    pub fn rate_value(&self, value: f64) -> Result<Rating> {
        let percentile = self.percentile(value)?;
        Ok(Rating {
            percentile,
            ignition_proportion: self.curve.evaluate(percentile),
        })
    }

    /// Rate every record; records without a moving average stay unrated.
    pub fn rate(&self, series: &SmoothedSeries) -> Result<RatedSeries> {
        let cover_type = self.cover_type();
        let records = series
            .records()
            .iter()
            .map(|smoothed| {
                let rating = smoothed
                    .moving_average
                    .map(|avg| self.rate_value(avg.value()))
                    .transpose()?;
                Ok(RatedRecord {
                    smoothed: *smoothed,
                    cover_type,
                    rating,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let rated = records.iter().filter(|r| r.rating.is_some()).count();
        debug!(
            "Rated {}/{} records at {} against {} reference ({} readings)",
            rated,
            records.len(),
            series.site_id(),
            cover_type,
            self.reference.len()
        );
        Ok(RatedSeries::from_ordered(series.site_id(), records))
    }
}

//! High/Medium/Low danger classification
//!
//! Thresholds partition the percentile axis into three half-open bands:
//! Low `[0, medium]`, Medium `(medium, high]`, High `(high, 100]`.

use crate::core_types::cover::{CoverType, ModelParameters, ModelVersion};
use crate::core_types::records::{ClassifiedRecord, ClassifiedSeries, DangerRating, RatedSeries};
use crate::core_types::units::Percentile;
use crate::error::{IgnitionError, Result, Stage};
use tracing::debug;

/// Percentile thresholds separating the three ratings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DangerThresholds {
    high: f64,
    medium: f64,
}

impl DangerThresholds {
    /// Custom thresholds. Both must lie in `[0, 100]` with `high > medium`.
    pub fn new(high: f64, medium: f64) -> Result<Self> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(high) || !in_range(medium) {
            return Err(IgnitionError::configuration(
                Stage::Classification,
                format!("thresholds must lie within [0, 100], got high {high}, medium {medium}"),
            ));
        }
        if high <= medium {
            return Err(IgnitionError::configuration(
                Stage::Classification,
                format!("high threshold {high} must be greater than medium threshold {medium}"),
            ));
        }
        Ok(Self { high, medium })
    }

    /// Calibrated thresholds for a cover type and model version
    pub fn for_model(cover_type: CoverType, version: ModelVersion) -> Self {
        let params = ModelParameters::lookup(cover_type, version);
        Self {
            high: params.high_threshold,
            medium: params.medium_threshold,
        }
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn medium(&self) -> f64 {
        self.medium
    }

    pub fn classify(&self, percentile: Percentile) -> DangerRating {
        let p = *percentile;
        if p > self.high {
            DangerRating::High
        } else if p > self.medium {
            DangerRating::Medium
        } else {
            DangerRating::Low
        }
    }
}

/// Assigns a danger rating to every rated record
#[derive(Debug, Clone, Copy)]
pub struct DangerClassifier {
    thresholds: DangerThresholds,
}

impl DangerClassifier {
    pub fn new(thresholds: DangerThresholds) -> Self {
        Self { thresholds }
    }

    pub fn for_model(cover_type: CoverType, version: ModelVersion) -> Self {
        Self::new(DangerThresholds::for_model(cover_type, version))
    }

    pub fn thresholds(&self) -> DangerThresholds {
        self.thresholds
    }

    /// Unrated records get no rating and contribute zero to every count.
    pub fn classify(&self, rated: &RatedSeries) -> ClassifiedSeries {
        let records: Vec<ClassifiedRecord> = rated
            .records()
            .iter()
            .map(|r| ClassifiedRecord {
                rated: *r,
                danger: r.percentile().map(|p| self.thresholds.classify(p)),
            })
            .collect();

        debug!(
            "Classified {} records at {} (high > {}, medium > {})",
            records.len(),
            rated.site_id(),
            self.thresholds.high,
            self.thresholds.medium
        );
        ClassifiedSeries::from_ordered(rated.site_id(), records)
    }
}

//! Per-day records flowing through the pipeline
//!
//! Each stage wraps the previous stage's record by value and adds its own
//! fields, so a stage output never aliases the input it was built from.

use crate::core_types::cover::CoverType;
use crate::core_types::season::Season;
use crate::core_types::units::{Millimeters, Percentile};
use crate::error::{IgnitionError, Result, Stage};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Anything that belongs to one calendar day
pub trait Dated {
    fn date(&self) -> NaiveDate;

    /// Raw deficit reading for the day, if any
    fn deficit(&self) -> Option<Millimeters>;
}

/// Raw daily water-balance deficit reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeficitRecord {
    pub date: NaiveDate,
    /// `None` when the reading was missing or unparseable
    pub deficit: Option<Millimeters>,
}

impl DeficitRecord {
    pub fn new(date: NaiveDate, deficit: Option<f64>) -> Self {
        Self {
            date,
            deficit: Millimeters::from_reading(deficit),
        }
    }

    /// Day of year, 1-366
    pub fn day_of_year(&self) -> u32 {
        self.date.ordinal()
    }
}

impl Dated for DeficitRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn deficit(&self) -> Option<Millimeters> {
        self.deficit
    }
}

/// Deficit record plus its trailing moving average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedRecord {
    pub base: DeficitRecord,
    /// `None` when every value in the trailing window was missing
    pub moving_average: Option<Millimeters>,
}

impl Dated for SmoothedRecord {
    fn date(&self) -> NaiveDate {
        self.base.date
    }

    fn deficit(&self) -> Option<Millimeters> {
        self.base.deficit
    }
}

/// Percentile rank and modelled ignition proportion for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub percentile: Percentile,
    pub ignition_proportion: f64,
}

/// Smoothed record rated against one cover type's reference distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatedRecord {
    pub smoothed: SmoothedRecord,
    pub cover_type: CoverType,
    /// `None` when the moving average was missing
    pub rating: Option<Rating>,
}

impl RatedRecord {
    pub fn percentile(&self) -> Option<Percentile> {
        self.rating.map(|r| r.percentile)
    }
}

impl Dated for RatedRecord {
    fn date(&self) -> NaiveDate {
        self.smoothed.date()
    }

    fn deficit(&self) -> Option<Millimeters> {
        self.smoothed.deficit()
    }
}

/// Categorical fire ignition potential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DangerRating {
    Low,
    Medium,
    High,
}

/// High/Medium/Low indicator values (or their sums over a window)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DangerIndicators {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl DangerIndicators {
    pub fn new(high: u32, medium: u32, low: u32) -> Self {
        Self { high, medium, low }
    }

    /// One-hot indicators for a single rating
    pub fn of(rating: DangerRating) -> Self {
        match rating {
            DangerRating::High => Self::new(1, 0, 0),
            DangerRating::Medium => Self::new(0, 1, 0),
            DangerRating::Low => Self::new(0, 0, 1),
        }
    }

    pub fn total(&self) -> u32 {
        self.high + self.medium + self.low
    }
}

impl AddAssign for DangerIndicators {
    fn add_assign(&mut self, rhs: Self) {
        self.high += rhs.high;
        self.medium += rhs.medium;
        self.low += rhs.low;
    }
}

/// Rated record plus its High/Medium/Low classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub rated: RatedRecord,
    /// `None` when the record carried no rating
    pub danger: Option<DangerRating>,
}

impl ClassifiedRecord {
    /// Indicator values; all zero for an unrated record
    pub fn indicators(&self) -> DangerIndicators {
        self.danger.map(DangerIndicators::of).unwrap_or_default()
    }

    pub fn season(&self) -> Season {
        Season::of(self.date())
    }
}

impl Dated for ClassifiedRecord {
    fn date(&self) -> NaiveDate {
        self.rated.date()
    }

    fn deficit(&self) -> Option<Millimeters> {
        self.rated.deficit()
    }
}

/// Date-ordered records for one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series<R> {
    site_id: String,
    records: Vec<R>,
}

pub type DeficitSeries = Series<DeficitRecord>;
pub type SmoothedSeries = Series<SmoothedRecord>;
pub type RatedSeries = Series<RatedRecord>;
pub type ClassifiedSeries = Series<ClassifiedRecord>;

impl<R: Dated> Series<R> {
    /// Build a series, checking dates are strictly ascending.
    ///
    /// Gaps between dates are allowed and are never filled.
    pub fn new(site_id: impl Into<String>, records: Vec<R>) -> Result<Self> {
        if let Some(pair) = records.windows(2).find(|w| w[0].date() >= w[1].date()) {
            return Err(IgnitionError::data(
                Stage::Input,
                format!(
                    "records must be in strictly ascending date order: {} followed by {}",
                    pair[0].date(),
                    pair[1].date()
                ),
            ));
        }
        Ok(Self {
            site_id: site_id.into(),
            records,
        })
    }

    /// Stage outputs preserve their input's order, so no re-check is needed.
    pub(crate) fn from_ordered(site_id: &str, records: Vec<R>) -> Self {
        Self {
            site_id: site_id.to_owned(),
            records,
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records with a non-null deficit reading
    pub fn reading_count(&self) -> usize {
        self.records.iter().filter(|r| r.deficit().is_some()).count()
    }

    /// New series keeping only records matching `keep`
    pub fn filtered(&self, mut keep: impl FnMut(&R) -> bool) -> Self
    where
        R: Clone,
    {
        let records = self.records.iter().filter(|r| keep(*r)).cloned().collect();
        Self::from_ordered(&self.site_id, records)
    }

    /// New series without records dated after `as_of`
    pub fn up_to(&self, as_of: NaiveDate) -> Self
    where
        R: Clone,
    {
        self.filtered(|r| r.date() <= as_of)
    }

    /// First and last date, if any
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.records.first()?.date(), self.records.last()?.date()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_series_rejects_unordered_dates() {
        let records = vec![
            DeficitRecord::new(day(2020, 1, 2), Some(1.0)),
            DeficitRecord::new(day(2020, 1, 1), Some(2.0)),
        ];
        let err = DeficitSeries::new("site", records).unwrap_err();
        assert_eq!(err.stage(), Stage::Input);
    }

    #[test]
    fn test_series_rejects_duplicate_dates() {
        let records = vec![
            DeficitRecord::new(day(2020, 1, 1), Some(1.0)),
            DeficitRecord::new(day(2020, 1, 1), Some(2.0)),
        ];
        assert!(DeficitSeries::new("site", records).is_err());
    }

    #[test]
    fn test_series_allows_gaps_and_nulls() {
        let records = vec![
            DeficitRecord::new(day(2020, 1, 1), Some(1.0)),
            DeficitRecord::new(day(2020, 3, 1), None),
            DeficitRecord::new(day(2020, 3, 2), Some(f64::NAN)),
        ];
        let series = DeficitSeries::new("site", records).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.reading_count(), 1);
        assert_eq!(series.date_span(), Some((day(2020, 1, 1), day(2020, 3, 2))));
    }

    #[test]
    fn test_up_to_drops_future_records_without_touching_source() {
        let records = (1..=5)
            .map(|d| DeficitRecord::new(day(2022, 6, d), Some(f64::from(d))))
            .collect();
        let series = DeficitSeries::new("site", records).unwrap();
        let trimmed = series.up_to(day(2022, 6, 3));
        assert_eq!(trimmed.len(), 3);
        assert_eq!(series.len(), 5);
    }

    #[test]
    fn test_indicators_are_one_hot() {
        for rating in [DangerRating::High, DangerRating::Medium, DangerRating::Low] {
            assert_eq!(DangerIndicators::of(rating).total(), 1);
        }
        let mut sum = DangerIndicators::default();
        sum += DangerIndicators::of(DangerRating::High);
        sum += DangerIndicators::of(DangerRating::High);
        sum += DangerIndicators::of(DangerRating::Low);
        assert_eq!(sum, DangerIndicators::new(2, 0, 1));
    }
}

//! Run configuration for the rating pipeline
//!
//! One [`RatingConfig`] is passed explicitly into each pipeline invocation;
//! there is no process-wide configuration state.

use crate::core_types::cover::{CoverType, ModelVersion};
use crate::error::{IgnitionError, Result, Stage};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fire-season day-of-year window, half-open `[start_doy, end_doy)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireSeasonWindow {
    pub start_doy: u32,
    pub end_doy: u32,
}

impl FireSeasonWindow {
    pub fn new(start_doy: u32, end_doy: u32) -> Result<Self> {
        let window = Self { start_doy, end_doy };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_doy >= self.end_doy {
            return Err(IgnitionError::configuration(
                Stage::Reference,
                format!(
                    "fire season window is inverted: start DOY {} >= end DOY {}",
                    self.start_doy, self.end_doy
                ),
            ));
        }
        if self.start_doy < 1 || self.end_doy > 367 {
            return Err(IgnitionError::configuration(
                Stage::Reference,
                format!(
                    "fire season window {}..{} lies outside day-of-year range 1..=366",
                    self.start_doy, self.end_doy
                ),
            ));
        }
        Ok(())
    }

    pub fn contains(&self, day_of_year: u32) -> bool {
        (self.start_doy..self.end_doy).contains(&day_of_year)
    }
}

/// Inclusive calendar range the reference distribution is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReferencePeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let period = Self { start, end };
        period.validate()?;
        Ok(period)
    }

    /// Whole calendar years `start_year..=end_year`
    pub fn years(start_year: i32, end_year: i32) -> Result<Self> {
        let start = jan_first(start_year, Stage::Reference)?;
        let end = dec_31(end_year, Stage::Reference)?;
        Self::new(start, end)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(IgnitionError::configuration(
                Stage::Reference,
                format!(
                    "reference period is inverted: {} is after {}",
                    self.start, self.end
                ),
            ));
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }
}

pub(crate) fn jan_first(year: i32, stage: Stage) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
        IgnitionError::configuration(stage, format!("year {year} is out of range"))
    })
}

pub(crate) fn dec_31(year: i32, stage: Stage) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| {
        IgnitionError::configuration(stage, format!("year {year} is out of range"))
    })
}

/// How classified days are bucketed before a normal is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationMode {
    /// Calendar-year buckets restricted to `start..=end`
    Years { start: i32, end: i32 },
    /// Every supplied record in a single bucket, no year restriction
    NowCast,
}

impl AggregationMode {
    /// Single calendar year
    pub fn year(year: i32) -> Self {
        AggregationMode::Years {
            start: year,
            end: year,
        }
    }

    /// Inclusive span of calendar years
    pub fn years(start: i32, end: i32) -> Self {
        AggregationMode::Years { start, end }
    }

    pub fn validate(&self) -> Result<()> {
        if let AggregationMode::Years { start, end } = *self {
            if start > end {
                return Err(IgnitionError::configuration(
                    Stage::Aggregation,
                    format!("year range is inverted: {start} > {end}"),
                ));
            }
            jan_first(start, Stage::Aggregation)?;
            dec_31(end, Stage::Aggregation)?;
        }
        Ok(())
    }

    /// Era label used on summaries, e.g. `"1991_2020"` or `"NowCast"`
    pub fn label(&self) -> String {
        match self {
            AggregationMode::Years { start, end } => format!("{start}_{end}"),
            AggregationMode::NowCast => "NowCast".to_owned(),
        }
    }

    /// Whether a date falls inside this mode's window
    pub fn includes(&self, date: NaiveDate) -> bool {
        match self {
            AggregationMode::Years { start, end } => (*start..=*end).contains(&date.year()),
            AggregationMode::NowCast => true,
        }
    }
}

/// Summary statistic requested from the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryStatistic {
    Sum,
    Mean,
}

impl FromStr for SummaryStatistic {
    type Err = IgnitionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Sum" => Ok(SummaryStatistic::Sum),
            "Mean" => Ok(SummaryStatistic::Mean),
            other => Err(IgnitionError::configuration(
                Stage::Aggregation,
                format!("undefined summary statistic '{other}'"),
            )),
        }
    }
}

impl fmt::Display for SummaryStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryStatistic::Sum => f.write_str("Sum"),
            SummaryStatistic::Mean => f.write_str("Mean"),
        }
    }
}

/// Temporal resolution requested from the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeStep {
    /// Calendar-year buckets
    Annual,
    /// Multi-year mean of annual buckets
    Normal,
    /// Single-year summary, reduced the same way as a normal
    Year,
}

impl FromStr for TimeStep {
    type Err = IgnitionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Annual" => Ok(TimeStep::Annual),
            "Normal" => Ok(TimeStep::Normal),
            "Year" => Ok(TimeStep::Year),
            other => Err(IgnitionError::configuration(
                Stage::Aggregation,
                format!("undefined time step '{other}'"),
            )),
        }
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeStep::Annual => f.write_str("Annual"),
            TimeStep::Normal => f.write_str("Normal"),
            TimeStep::Year => f.write_str("Year"),
        }
    }
}

/// First day of both preset reference periods
pub const REFERENCE_START: NaiveDate = calendar_date(1984, 1, 1);

/// Last day of the historic preset's reference period
pub const HISTORIC_REFERENCE_END: NaiveDate = calendar_date(2005, 12, 31);

/// Last day of the now-cast preset's reference period
pub const NOW_CAST_REFERENCE_END: NaiveDate = calendar_date(2021, 12, 31);

/// Only for constants: an invalid date fails compilation.
const fn calendar_date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid calendar date"),
    }
}

/// Configuration for one site's rating run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    pub site_id: String,
    pub forest_season: FireSeasonWindow,
    pub non_forest_season: FireSeasonWindow,
    pub reference_period: ReferencePeriod,
    /// Trailing moving-average width in days
    pub window_days: usize,
    pub model_version: ModelVersion,
}

impl RatingConfig {
    /// Historic/normals configuration: 14-day window, 1984-2005 reference
    pub fn historic(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            forest_season: FireSeasonWindow {
                start_doy: 7,
                end_doy: 303,
            },
            non_forest_season: FireSeasonWindow {
                start_doy: 74,
                end_doy: 301,
            },
            reference_period: ReferencePeriod {
                start: REFERENCE_START,
                end: HISTORIC_REFERENCE_END,
            },
            window_days: 14,
            model_version: ModelVersion::V2,
        }
    }

    /// Now-cast configuration: 7-day window, 1984-2021 reference
    pub fn now_cast(site_id: impl Into<String>) -> Self {
        Self {
            forest_season: FireSeasonWindow {
                start_doy: 7,
                end_doy: 301,
            },
            non_forest_season: FireSeasonWindow {
                start_doy: 79,
                end_doy: 303,
            },
            reference_period: ReferencePeriod {
                start: REFERENCE_START,
                end: NOW_CAST_REFERENCE_END,
            },
            window_days: 7,
            ..Self::historic(site_id)
        }
    }

    pub fn with_model_version(mut self, version: ModelVersion) -> Self {
        self.model_version = version;
        self
    }

    pub fn with_window_days(mut self, window_days: usize) -> Self {
        self.window_days = window_days;
        self
    }

    pub fn with_reference_period(mut self, period: ReferencePeriod) -> Self {
        self.reference_period = period;
        self
    }

    /// Fire season window for a cover type
    pub fn season(&self, cover_type: CoverType) -> FireSeasonWindow {
        match cover_type {
            CoverType::Forest => self.forest_season,
            CoverType::NonForest => self.non_forest_season,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_days == 0 {
            return Err(IgnitionError::configuration(
                Stage::Config,
                "moving-average window must be at least 1 day",
            ));
        }
        self.forest_season.validate()?;
        self.non_forest_season.validate()?;
        self.reference_period.validate()
    }
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self::historic("site")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_presets_validate() {
        RatingConfig::historic("FLFOForest_1").validate().unwrap();
        RatingConfig::now_cast("FLFOGrass_1").validate().unwrap();
    }

    #[test]
    fn test_preset_reference_dates() {
        assert_eq!(REFERENCE_START, day(1984, 1, 1));
        assert_eq!(HISTORIC_REFERENCE_END, day(2005, 12, 31));
        assert_eq!(NOW_CAST_REFERENCE_END, day(2021, 12, 31));
        let historic = RatingConfig::historic("x").reference_period;
        assert_eq!((historic.start, historic.end), (REFERENCE_START, HISTORIC_REFERENCE_END));
    }

    #[test]
    fn test_now_cast_preset_overrides() {
        let cfg = RatingConfig::now_cast("x");
        assert_eq!(cfg.window_days, 7);
        assert_eq!(cfg.non_forest_season, FireSeasonWindow::new(79, 303).unwrap());
        assert_eq!(cfg.reference_period.end, day(2021, 12, 31));
        assert_eq!(cfg.site_id, "x");
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = FireSeasonWindow::new(303, 7).unwrap_err();
        assert!(matches!(err, IgnitionError::Configuration { .. }));
        assert!(FireSeasonWindow::new(7, 7).is_err());
        assert!(FireSeasonWindow::new(0, 10).is_err());
        assert!(FireSeasonWindow::new(1, 367).is_ok());
    }

    #[test]
    fn test_window_is_half_open() {
        let window = FireSeasonWindow::new(7, 303).unwrap();
        assert!(!window.contains(6));
        assert!(window.contains(7));
        assert!(window.contains(302));
        assert!(!window.contains(303));
    }

    #[test]
    fn test_reference_period_is_inclusive() {
        let period = ReferencePeriod::years(1984, 2005).unwrap();
        assert!(period.contains(day(1984, 1, 1)));
        assert!(period.contains(day(2005, 12, 31)));
        assert!(!period.contains(day(2006, 1, 1)));
        assert!(ReferencePeriod::new(day(2005, 1, 1), day(1984, 1, 1)).is_err());
    }

    #[test]
    fn test_zero_window_rejected() {
        let cfg = RatingConfig::historic("x").with_window_days(0);
        assert!(matches!(
            cfg.validate(),
            Err(IgnitionError::Configuration { stage: Stage::Config, .. })
        ));
    }

    #[test]
    fn test_statistic_and_time_step_parsing() {
        assert_eq!("Mean".parse::<SummaryStatistic>().unwrap(), SummaryStatistic::Mean);
        assert_eq!("Normal".parse::<TimeStep>().unwrap(), TimeStep::Normal);
        assert!("Median".parse::<SummaryStatistic>().is_err());
        assert!("Monthly".parse::<TimeStep>().is_err());
    }

    #[test]
    fn test_aggregation_labels() {
        assert_eq!(AggregationMode::years(1991, 2020).label(), "1991_2020");
        assert_eq!(AggregationMode::year(2022).label(), "2022_2022");
        assert_eq!(AggregationMode::NowCast.label(), "NowCast");
        assert!(AggregationMode::years(2020, 1991).validate().is_err());
    }
}

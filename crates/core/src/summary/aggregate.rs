//! Temporal aggregation of classified days
//!
//! Daily indicators are summed into calendar-year buckets (or one now-cast
//! bucket), and the buckets are reduced to a "normal": the arithmetic mean
//! of each count across the buckets.

use crate::config::{AggregationMode, SummaryStatistic, TimeStep};
use crate::core_types::cover::CoverType;
use crate::core_types::records::{ClassifiedSeries, DangerIndicators, Dated};
use crate::error::{IgnitionError, Result, Stage};
use crate::summary::projection::ProjectionLabel;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// High/Medium/Low day counts for one calendar year or one now-cast window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualSummary {
    pub site_id: String,
    pub cover_type: CoverType,
    /// Year (`"2022"`) or `"NowCast"`
    pub label: String,
    /// `None` for a now-cast bucket
    pub year: Option<i32>,
    pub counts: DangerIndicators,
}

/// Mean annual High/Medium/Low day counts over an era
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalSummary {
    pub site_id: String,
    pub cover_type: CoverType,
    /// Era label, e.g. `"1991_2020"` or `"NowCast"`
    pub date_range: String,
    pub rcp: Option<String>,
    pub gcm: Option<String>,
    pub high_mean: f64,
    pub medium_mean: f64,
    pub low_mean: f64,
    /// Now-cast only: records in the window with a deficit reading
    pub now_cast_count: Option<usize>,
}

impl NormalSummary {
    /// Scenario label for reports, `"na"` for historic runs
    pub fn rcp_label(&self) -> &str {
        self.rcp.as_deref().unwrap_or("na")
    }

    /// Climate model label for reports, `"na"` for historic runs
    pub fn gcm_label(&self) -> &str {
        self.gcm.as_deref().unwrap_or("na")
    }
}

/// Resamples classified series into annual counts and normals
#[derive(Debug, Clone, Copy)]
pub struct TemporalAggregator {
    mode: AggregationMode,
}

impl TemporalAggregator {
    pub fn new(mode: AggregationMode) -> Result<Self> {
        mode.validate()?;
        Ok(Self { mode })
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    /// Sum indicators per bucket. Only `Sum` over `Annual` is defined.
    pub fn resample(
        &self,
        series: &ClassifiedSeries,
        statistic: SummaryStatistic,
        time_step: TimeStep,
    ) -> Result<Vec<AnnualSummary>> {
        if (statistic, time_step) != (SummaryStatistic::Sum, TimeStep::Annual) {
            return Err(IgnitionError::configuration(
                Stage::Aggregation,
                format!("time step '{time_step}' with statistic '{statistic}' cannot be resampled"),
            ));
        }

        let cover_type = Self::cover_type_of(series)?;
        let mut window = series
            .records()
            .iter()
            .filter(|r| self.mode.includes(r.date()))
            .peekable();
        if window.peek().is_none() {
            return Err(IgnitionError::data(
                Stage::Aggregation,
                format!(
                    "no classified records at {} for {}",
                    series.site_id(),
                    self.mode.label()
                ),
            ));
        }

        let summaries = match self.mode {
            AggregationMode::NowCast => {
                let mut counts = DangerIndicators::default();
                for record in window {
                    counts += record.indicators();
                }
                vec![AnnualSummary {
                    site_id: series.site_id().to_owned(),
                    cover_type,
                    label: self.mode.label(),
                    year: None,
                    counts,
                }]
            }
            AggregationMode::Years { .. } => {
                let mut by_year: BTreeMap<i32, DangerIndicators> = BTreeMap::new();
                for record in window {
                    *by_year.entry(record.date().year()).or_default() += record.indicators();
                }
                // Years between the first and last present year with no
                // records still get a zero bucket.
                let first = by_year.keys().next().copied().unwrap_or_default();
                let last = by_year.keys().next_back().copied().unwrap_or(first);
                (first..=last)
                    .map(|year| AnnualSummary {
                        site_id: series.site_id().to_owned(),
                        cover_type,
                        label: year.to_string(),
                        year: Some(year),
                        counts: by_year.get(&year).copied().unwrap_or_default(),
                    })
                    .collect()
            }
        };

        debug!(
            "Resampled {} at {} into {} bucket(s) for {}",
            cover_type,
            series.site_id(),
            summaries.len(),
            self.mode.label()
        );
        Ok(summaries)
    }

    /// Annual sums, equivalent to `resample(Sum, Annual)`
    pub fn annual(&self, series: &ClassifiedSeries) -> Result<Vec<AnnualSummary>> {
        self.resample(series, SummaryStatistic::Sum, TimeStep::Annual)
    }

    /// Reduce annual sums to their mean. Only `Mean` over `Normal` or
    /// `Year` is defined.
    pub fn normal(
        &self,
        annual: &[AnnualSummary],
        statistic: SummaryStatistic,
        time_step: TimeStep,
        projection: Option<&ProjectionLabel>,
    ) -> Result<NormalSummary> {
        if statistic != SummaryStatistic::Mean || time_step == TimeStep::Annual {
            return Err(IgnitionError::configuration(
                Stage::Aggregation,
                format!("undefined statistic '{statistic}' for time step '{time_step}'"),
            ));
        }

        let first = annual.first().ok_or_else(|| {
            IgnitionError::data(Stage::Aggregation, "cannot take a normal of zero annual summaries")
        })?;
        if let Some(other) = annual
            .iter()
            .find(|a| a.site_id != first.site_id || a.cover_type != first.cover_type)
        {
            return Err(IgnitionError::data(
                Stage::Aggregation,
                format!(
                    "annual summaries mix {} {} with {} {}",
                    first.site_id, first.cover_type, other.site_id, other.cover_type
                ),
            ));
        }

        let n = annual.len() as f64;
        let mut totals = [0.0_f64; 3];
        for a in annual {
            totals[0] += f64::from(a.counts.high);
            totals[1] += f64::from(a.counts.medium);
            totals[2] += f64::from(a.counts.low);
        }

        Ok(NormalSummary {
            site_id: first.site_id.clone(),
            cover_type: first.cover_type,
            date_range: self.mode.label(),
            rcp: projection.map(|p| p.rcp.clone()),
            gcm: projection.map(|p| p.gcm.clone()),
            high_mean: totals[0] / n,
            medium_mean: totals[1] / n,
            low_mean: totals[2] / n,
            now_cast_count: None,
        })
    }

    /// Annual sums reduced to a normal; now-cast normals also carry the
    /// number of records in the window with a deficit reading.
    pub fn summarize(
        &self,
        series: &ClassifiedSeries,
        projection: Option<&ProjectionLabel>,
    ) -> Result<NormalSummary> {
        let annual = self.annual(series)?;
        let time_step = match self.mode {
            AggregationMode::Years { start, end } if start == end => TimeStep::Year,
            _ => TimeStep::Normal,
        };
        let mut normal = self.normal(&annual, SummaryStatistic::Mean, time_step, projection)?;
        if self.mode == AggregationMode::NowCast {
            normal.now_cast_count = Some(series.reading_count());
        }
        Ok(normal)
    }

    fn cover_type_of(series: &ClassifiedSeries) -> Result<CoverType> {
        let mut covers = series.records().iter().map(|r| r.rated.cover_type);
        let cover = covers.next().ok_or_else(|| {
            IgnitionError::data(
                Stage::Aggregation,
                format!("classified series at {} is empty", series.site_id()),
            )
        })?;
        if covers.any(|c| c != cover) {
            return Err(IgnitionError::data(
                Stage::Aggregation,
                format!("classified series at {} mixes cover types", series.site_id()),
            ));
        }
        Ok(cover)
    }
}

/// One single-year normal per year in `first_year..=last_year`
pub fn yearly_normals(
    series: &ClassifiedSeries,
    first_year: i32,
    last_year: i32,
    projection: Option<&ProjectionLabel>,
) -> Result<Vec<NormalSummary>> {
    (first_year..=last_year)
        .map(|year| {
            TemporalAggregator::new(AggregationMode::year(year))?.summarize(series, projection)
        })
        .collect()
}

/// Single-year normals for the `years` calendar years before `year`
pub fn trailing_normals(
    series: &ClassifiedSeries,
    year: i32,
    years: u32,
    projection: Option<&ProjectionLabel>,
) -> Result<Vec<NormalSummary>> {
    if years == 0 {
        return Ok(Vec::new());
    }
    let span = i32::try_from(years).map_err(|_| {
        IgnitionError::configuration(
            Stage::Aggregation,
            format!("look-back of {years} years is too long"),
        )
    })?;
    yearly_normals(series, year.saturating_sub(span), year - 1, projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::records::{
        ClassifiedRecord, DangerRating, DeficitRecord, RatedRecord, Rating, SmoothedRecord,
    };
    use crate::core_types::units::Percentile;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn classified(date: NaiveDate, danger: Option<DangerRating>) -> ClassifiedRecord {
        let base = DeficitRecord::new(date, danger.map(|_| 50.0));
        ClassifiedRecord {
            rated: RatedRecord {
                smoothed: SmoothedRecord {
                    base,
                    moving_average: base.deficit,
                },
                cover_type: CoverType::Forest,
                rating: danger.map(|_| Rating {
                    percentile: Percentile::new(50.0),
                    ignition_proportion: 0.0,
                }),
            },
            danger,
        }
    }

    fn series(records: Vec<ClassifiedRecord>) -> ClassifiedSeries {
        ClassifiedSeries::new("FLFOForest_1", records).unwrap()
    }

    fn annual(year: i32, high: u32) -> AnnualSummary {
        AnnualSummary {
            site_id: "FLFOForest_1".into(),
            cover_type: CoverType::Forest,
            label: year.to_string(),
            year: Some(year),
            counts: DangerIndicators::new(high, 0, 0),
        }
    }

    #[test]
    fn test_single_high_day_round_trip() {
        let s = series(vec![classified(day(2015, 8, 1), Some(DangerRating::High))]);
        let annual = TemporalAggregator::new(AggregationMode::year(2015))
            .unwrap()
            .annual(&s)
            .unwrap();
        assert_eq!(annual.len(), 1);
        assert_eq!(annual[0].year, Some(2015));
        assert_eq!(annual[0].counts, DangerIndicators::new(1, 0, 0));
    }

    #[test]
    fn test_years_outside_range_are_dropped() {
        let s = series(vec![
            classified(day(2014, 12, 31), Some(DangerRating::High)),
            classified(day(2015, 1, 1), Some(DangerRating::Low)),
            classified(day(2016, 1, 1), Some(DangerRating::High)),
        ]);
        let annual = TemporalAggregator::new(AggregationMode::year(2015))
            .unwrap()
            .annual(&s)
            .unwrap();
        assert_eq!(annual.len(), 1);
        assert_eq!(annual[0].counts, DangerIndicators::new(0, 0, 1));
    }

    #[test]
    fn test_gap_years_get_zero_buckets() {
        let s = series(vec![
            classified(day(2001, 6, 1), Some(DangerRating::Medium)),
            classified(day(2003, 6, 1), Some(DangerRating::Medium)),
        ]);
        let annual = TemporalAggregator::new(AggregationMode::years(2000, 2005))
            .unwrap()
            .annual(&s)
            .unwrap();
        let years: Vec<_> = annual.iter().map(|a| a.year.unwrap()).collect();
        assert_eq!(years, vec![2001, 2002, 2003]);
        assert_eq!(annual[1].counts, DangerIndicators::default());
    }

    #[test]
    fn test_unrated_days_count_nothing() {
        let s = series(vec![
            classified(day(2010, 3, 1), None),
            classified(day(2010, 3, 2), Some(DangerRating::Medium)),
        ]);
        let annual = TemporalAggregator::new(AggregationMode::year(2010))
            .unwrap()
            .annual(&s)
            .unwrap();
        assert_eq!(annual[0].counts.total(), 1);
    }

    #[test]
    fn test_now_cast_ignores_year_boundaries() {
        let s = series(vec![
            classified(day(2022, 12, 30), Some(DangerRating::Low)),
            classified(day(2022, 12, 31), None),
            classified(day(2023, 1, 1), Some(DangerRating::High)),
        ]);
        let aggregator = TemporalAggregator::new(AggregationMode::NowCast).unwrap();
        let annual = aggregator.annual(&s).unwrap();
        assert_eq!(annual.len(), 1);
        assert_eq!(annual[0].label, "NowCast");
        assert_eq!(annual[0].counts, DangerIndicators::new(1, 0, 1));

        let normal = aggregator.summarize(&s, None).unwrap();
        assert_eq!(normal.now_cast_count, Some(2));
        assert_eq!(normal.date_range, "NowCast");
    }

    #[test]
    fn test_normal_is_exact_mean() {
        let era = AggregationMode::Years {
            start: 2001,
            end: 2003,
        };
        let aggregator = TemporalAggregator::new(era).unwrap();
        let rows = [annual(2001, 5), annual(2002, 6), annual(2003, 7)];
        let normal = aggregator
            .normal(&rows, SummaryStatistic::Mean, TimeStep::Normal, None)
            .unwrap();
        assert_eq!(normal.high_mean, 6.0);
        assert_eq!(normal.medium_mean, 0.0);
        assert_eq!(normal.date_range, "2001_2003");
        assert_eq!(normal.rcp_label(), "na");
        assert_eq!(normal.gcm_label(), "na");
    }

    #[test]
    fn test_normal_carries_projection_labels() {
        let era = AggregationMode::Years {
            start: 2031,
            end: 2060,
        };
        let aggregator = TemporalAggregator::new(era).unwrap();
        let label: ProjectionLabel = "deficit_MIROC5_rcp85".parse().unwrap();
        let normal = aggregator
            .normal(&[annual(2031, 2)], SummaryStatistic::Mean, TimeStep::Normal, Some(&label))
            .unwrap();
        assert_eq!(normal.gcm.as_deref(), Some("MIROC5"));
        assert_eq!(normal.rcp.as_deref(), Some("rcp85"));
    }

    #[test]
    fn test_undefined_statistic_combinations() {
        let aggregator = TemporalAggregator::new(AggregationMode::year(2001)).unwrap();
        let s = series(vec![classified(day(2001, 1, 1), Some(DangerRating::Low))]);
        assert!(matches!(
            aggregator.resample(&s, SummaryStatistic::Mean, TimeStep::Annual),
            Err(IgnitionError::Configuration { .. })
        ));
        assert!(matches!(
            aggregator.normal(&[annual(2001, 1)], SummaryStatistic::Sum, TimeStep::Normal, None),
            Err(IgnitionError::Configuration { .. })
        ));
        assert!(matches!(
            aggregator.normal(&[annual(2001, 1)], SummaryStatistic::Mean, TimeStep::Annual, None),
            Err(IgnitionError::Configuration { .. })
        ));
    }

    #[test]
    fn test_empty_window_is_a_data_error() {
        let s = series(vec![classified(day(1999, 1, 1), Some(DangerRating::Low))]);
        let err = TemporalAggregator::new(AggregationMode::year(2001))
            .unwrap()
            .annual(&s)
            .unwrap_err();
        assert!(matches!(err, IgnitionError::Data { stage: Stage::Aggregation, .. }));
        assert!(TemporalAggregator::new(AggregationMode::year(2001))
            .unwrap()
            .normal(&[], SummaryStatistic::Mean, TimeStep::Normal, None)
            .is_err());
    }

    #[test]
    fn test_yearly_normals_one_per_year() {
        let s = series(vec![
            classified(day(2020, 7, 1), Some(DangerRating::High)),
            classified(day(2021, 7, 1), Some(DangerRating::Low)),
        ]);
        let normals = yearly_normals(&s, 2020, 2021, None).unwrap();
        assert_eq!(normals.len(), 2);
        assert_eq!(normals[0].date_range, "2020_2020");
        assert_eq!(normals[0].high_mean, 1.0);
        assert_eq!(normals[1].low_mean, 1.0);
    }

    #[test]
    fn test_trailing_normals_stop_before_year() {
        let s = series(vec![
            classified(day(2019, 7, 1), Some(DangerRating::Medium)),
            classified(day(2020, 7, 1), Some(DangerRating::High)),
            classified(day(2021, 7, 1), Some(DangerRating::Low)),
            classified(day(2022, 7, 1), Some(DangerRating::High)),
        ]);
        let normals = trailing_normals(&s, 2022, 2, None).unwrap();
        let eras: Vec<_> = normals.iter().map(|n| n.date_range.as_str()).collect();
        assert_eq!(eras, vec!["2020_2020", "2021_2021"]);
        assert!(trailing_normals(&s, 2022, 0, None).unwrap().is_empty());
    }
}

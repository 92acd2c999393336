//! Trailing moving average of the deficit reading

use crate::core_types::records::{DeficitSeries, SmoothedRecord, SmoothedSeries};
use crate::core_types::units::Millimeters;
use crate::error::{IgnitionError, Result, Stage};
use std::collections::VecDeque;
use tracing::debug;

/// Computes a trailing mean over the last `window_days` records.
///
/// The window counts records, not calendar days: a gap in the input does not
/// shrink the window. The first `window_days - 1` records average over fewer
/// values, and one non-null reading in the window is enough to produce a mean.
#[derive(Debug, Clone, Copy)]
pub struct SmoothedSeriesBuilder {
    window_days: usize,
}

impl SmoothedSeriesBuilder {
    pub fn new(window_days: usize) -> Result<Self> {
        if window_days == 0 {
            return Err(IgnitionError::configuration(
                Stage::Smoothing,
                "moving-average window must be at least 1 day",
            ));
        }
        Ok(Self { window_days })
    }

    pub fn window_days(&self) -> usize {
        self.window_days
    }

    /// Fails with a computation error if a window mean is not finite.
    pub fn build(&self, series: &DeficitSeries) -> Result<SmoothedSeries> {
        let mut window: VecDeque<Option<f64>> = VecDeque::with_capacity(self.window_days);
        let mut records = Vec::with_capacity(series.len());

        for record in series.records() {
            if window.len() == self.window_days {
                window.pop_front();
            }
            window.push_back(record.deficit.map(Millimeters::value));

            let moving_average = match window_mean(&window) {
                Some(mean) if !mean.is_finite() => {
                    return Err(IgnitionError::computation(
                        Stage::Smoothing,
                        format!(
                            "moving average at {} on {} is not finite",
                            series.site_id(),
                            record.date
                        ),
                    ));
                }
                mean => mean.map(Millimeters::new),
            };
            records.push(SmoothedRecord {
                base: *record,
                moving_average,
            });
        }

        debug!(
            "Smoothed {} records at {} with a {}-day window",
            records.len(),
            series.site_id(),
            self.window_days
        );
        Ok(SmoothedSeries::from_ordered(series.site_id(), records))
    }
}

/// Mean of the present readings, summed afresh for every window. A window
/// of equal values averages to exactly that value. Falls back to pre-scaled
/// terms when the plain sum overflows.
fn window_mean(window: &VecDeque<Option<f64>>) -> Option<f64> {
    let mut present = window.iter().flatten().copied();
    let first = present.next()?;
    if present.all(|v| v == first) {
        return Some(first);
    }
    let present = window.iter().flatten().count();
    let n = present as f64;
    let sum: f64 = window.iter().flatten().sum();
    if sum.is_finite() {
        Some(sum / n)
    } else {
        Some(window.iter().flatten().map(|v| v / n).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::cover::{CoverType, ModelVersion};
    use crate::core_types::records::DeficitRecord;
    use crate::rating::{PercentileRater, ReferenceDistribution};
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[Option<f64>]) -> DeficitSeries {
        let start = NaiveDate::from_ymd_opt(2020, 7, 1).unwrap();
        let records = values
            .iter()
            .enumerate()
            .map(|(i, v)| DeficitRecord::new(start + Duration::days(i as i64), *v))
            .collect();
        DeficitSeries::new("test", records).unwrap()
    }

    fn averages(smoothed: &SmoothedSeries) -> Vec<Option<f64>> {
        smoothed
            .records()
            .iter()
            .map(|r| r.moving_average.map(Millimeters::value))
            .collect()
    }

    #[test]
    fn test_window_of_one_is_identity() {
        let input = [Some(1.5), None, Some(-2.25), Some(100.0), Some(0.1 + 0.2)];
        let smoothed = SmoothedSeriesBuilder::new(1).unwrap().build(&series(&input)).unwrap();
        assert_eq!(averages(&smoothed), input.to_vec());
    }

    #[test]
    fn test_leading_records_use_partial_window() {
        let input = [Some(2.0), Some(4.0), Some(6.0), Some(8.0)];
        let smoothed = SmoothedSeriesBuilder::new(3).unwrap().build(&series(&input)).unwrap();
        let got = averages(&smoothed);
        assert_relative_eq!(got[0].unwrap(), 2.0);
        assert_relative_eq!(got[1].unwrap(), 3.0);
        assert_relative_eq!(got[2].unwrap(), 4.0);
        assert_relative_eq!(got[3].unwrap(), 6.0);
    }

    #[test]
    fn test_nulls_are_skipped_in_the_mean() {
        let input = [Some(2.0), None, Some(6.0), None, None, None];
        let smoothed = SmoothedSeriesBuilder::new(3).unwrap().build(&series(&input)).unwrap();
        let got = averages(&smoothed);
        assert_relative_eq!(got[1].unwrap(), 2.0);
        assert_relative_eq!(got[2].unwrap(), 4.0);
        assert_relative_eq!(got[3].unwrap(), 6.0);
        assert_relative_eq!(got[4].unwrap(), 6.0);
        // Window [None, None, None]
        assert_eq!(got[5], None);
    }

    #[test]
    fn test_all_null_prefix_stays_null() {
        let input = [None, None, Some(3.0)];
        let smoothed = SmoothedSeriesBuilder::new(7).unwrap().build(&series(&input)).unwrap();
        assert_eq!(averages(&smoothed), vec![None, None, Some(3.0)]);
    }

    #[test]
    fn test_source_series_is_untouched() {
        let input = series(&[Some(1.0), Some(3.0)]);
        let before = input.clone();
        SmoothedSeriesBuilder::new(2).unwrap().build(&input).unwrap();
        assert_eq!(input, before);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(matches!(
            SmoothedSeriesBuilder::new(0),
            Err(IgnitionError::Configuration { stage: Stage::Smoothing, .. })
        ));
    }

    #[test]
    fn test_trailing_zeros_average_to_exact_zero() {
        let mut input = vec![Some(0.1); 3];
        input.extend([Some(0.0); 7]);
        let smoothed = SmoothedSeriesBuilder::new(7).unwrap().build(&series(&input)).unwrap();
        let got = averages(&smoothed);
        assert_eq!(got[9], Some(0.0));

        // A zero mean ranks at the bottom of a reference full of zero days
        let values = std::iter::repeat_n(Some(0.0), 40).chain((1..=60).map(|v| Some(f64::from(v))));
        let reference = ReferenceDistribution::from_values(CoverType::Forest, values);
        let rater = PercentileRater::new(&reference, ModelVersion::V2).unwrap();
        assert_eq!(rater.percentile(got[9].unwrap()).unwrap().value(), 0.0);
    }

    #[test]
    fn test_decaying_readings_settle_on_last_value() {
        let input: Vec<_> = (0..20).map(|i| Some(0.7_f64.powi(i).min(0.3))).collect();
        let mut tail = input.clone();
        tail.extend([Some(0.25); 5]);
        let smoothed = SmoothedSeriesBuilder::new(5).unwrap().build(&series(&tail)).unwrap();
        assert_eq!(averages(&smoothed).last().copied().flatten(), Some(0.25));
    }

    #[test]
    fn test_equal_readings_average_exactly() {
        let input = [Some(0.1); 7];
        let smoothed = SmoothedSeriesBuilder::new(7).unwrap().build(&series(&input)).unwrap();
        assert!(averages(&smoothed).iter().all(|v| *v == Some(0.1)));
    }

    #[test]
    fn test_huge_readings_do_not_overflow() {
        let input = [Some(f64::MAX), Some(f64::MAX / 2.0)];
        let smoothed = SmoothedSeriesBuilder::new(2).unwrap().build(&series(&input)).unwrap();
        let got = averages(&smoothed);
        assert_eq!(got[0], Some(f64::MAX));
        assert_relative_eq!(got[1].unwrap(), f64::MAX * 0.75, max_relative = 1e-12);
    }
}

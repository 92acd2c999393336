//! Now-cast window selection
//!
//! A now-cast rates the days from today through a short forecast horizon
//! against the same historical reference as the historic series.

use crate::core_types::records::{Dated, Series};
use crate::error::{IgnitionError, Result, Stage};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default forecast horizon in days
pub const DEFAULT_HORIZON_DAYS: u64 = 60;

/// Inclusive window `today..=today + horizon_days`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowCastWindow {
    pub today: NaiveDate,
    pub horizon_days: u64,
}

impl NowCastWindow {
    pub fn new(today: NaiveDate, horizon_days: u64) -> Result<Self> {
        let window = Self { today, horizon_days };
        window.last_day()?;
        Ok(window)
    }

    /// Window with the default 60-day horizon
    pub fn from_today(today: NaiveDate) -> Result<Self> {
        Self::new(today, DEFAULT_HORIZON_DAYS)
    }

    pub fn last_day(&self) -> Result<NaiveDate> {
        self.today
            .checked_add_days(Days::new(self.horizon_days))
            .ok_or_else(|| {
                IgnitionError::configuration(
                    Stage::NowCast,
                    format!(
                        "now-cast horizon of {} days from {} is out of range",
                        self.horizon_days, self.today
                    ),
                )
            })
    }

    /// Records inside the window that carry a deficit reading
    pub fn select<R: Dated + Clone>(&self, series: &Series<R>) -> Result<Series<R>> {
        let last = self.last_day()?;
        Ok(series.filtered(|r| (self.today..=last).contains(&r.date()) && r.deficit().is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::records::{DeficitRecord, DeficitSeries};
    use chrono::Duration;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_selects_inclusive_window_with_readings() {
        let start = day(2024, 5, 1);
        let records = (0..100)
            .map(|i| {
                let reading = if i == 20 { None } else { Some(f64::from(i)) };
                DeficitRecord::new(start + Duration::days(i64::from(i)), reading)
            })
            .collect();
        let series = DeficitSeries::new("site", records).unwrap();

        let window = NowCastWindow::from_today(day(2024, 5, 11)).unwrap();
        let selected = window.select(&series).unwrap();

        // May 11 (index 10) through July 10 (index 70), minus the null at index 20
        assert_eq!(selected.len(), 60);
        assert_eq!(selected.date_span(), Some((day(2024, 5, 11), day(2024, 7, 10))));
        assert_eq!(selected.reading_count(), selected.len());
    }

    #[test]
    fn test_horizon_overflow_rejected() {
        assert!(NowCastWindow::new(NaiveDate::MAX, 1).is_err());
    }
}

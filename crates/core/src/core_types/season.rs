//! Meteorological seasons used to label daily ratings

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-month meteorological season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    /// December, January, February
    Winter,
    /// March, April, May
    Spring,
    /// June, July, August
    Summer,
    /// September, October, November
    Fall,
}

impl Season {
    /// Season for a calendar month (1-12). Months outside 1-12 return `None`.
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            9..=11 => Some(Season::Fall),
            _ => None,
        }
    }

    /// Season a calendar date falls in
    pub fn of(date: NaiveDate) -> Self {
        Self::from_month(date.month()).unwrap_or(Season::Fall)
    }

    /// Sortable report label, e.g. `"1-Winter-DJF"`
    pub fn label(&self) -> &'static str {
        match self {
            Season::Winter => "1-Winter-DJF",
            Season::Spring => "2-Spring-MAM",
            Season::Summer => "3-Summer-JJA",
            Season::Fall => "4-Fall-SON",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

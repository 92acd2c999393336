//! Daily rating stages: reference distribution, smoothing, percentile
//! rating and danger classification.

pub mod classify;
pub mod percentile;
pub mod reference;
pub mod smoothing;

pub use classify::{DangerClassifier, DangerThresholds};
pub use percentile::{IgnitionCurve, PercentileRater};
pub use reference::{ReferenceDistribution, SeasonalReferenceBuilder};
pub use smoothing::SmoothedSeriesBuilder;

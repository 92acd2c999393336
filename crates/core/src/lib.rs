//! Fire Ignition Core Library
//!
//! Daily fire-ignition danger from climatic water deficit. Each day's
//! smoothed deficit is ranked against a historical fire-season reference
//! distribution, converted to an ignition proportion with an empirical
//! exponential curve, and classified as High, Medium or Low danger. The
//! classified days are counted per year and reduced to long-term normals
//! for historic runs, climate projections (with multi-model ensembles) and
//! short-horizon now-casts.
//!
//! ## Pipeline
//!
//! - [`rating::SeasonalReferenceBuilder`]: fire-season reference readings
//! - [`rating::SmoothedSeriesBuilder`]: trailing moving average
//! - [`rating::PercentileRater`]: percentile and ignition proportion
//! - [`rating::DangerClassifier`]: High/Medium/Low thresholds
//! - [`summary::TemporalAggregator`]: annual counts and normals
//! - [`summary::EnsembleAverager`]: multi-model means
//!
//! [`RatingPipeline`] wires the stages together for one site and
//! configuration, and [`pipeline::run_batch`] runs many series against it
//! in parallel.

pub mod config;
pub mod core_types;
pub mod error;
pub mod pipeline;
pub mod rating;
pub mod summary;

// Re-export core types
pub use core_types::{
    ClassifiedRecord, ClassifiedSeries, CoverType, DangerIndicators, DangerRating, DeficitRecord,
    Dated, DeficitSeries, Millimeters, ModelParameters, ModelVersion, Percentile, RatedRecord,
    RatedSeries, Rating, Season, Series, SmoothedRecord, SmoothedSeries,
};

pub use config::{
    AggregationMode, FireSeasonWindow, RatingConfig, ReferencePeriod, SummaryStatistic, TimeStep,
};
pub use error::{IgnitionError, Result, Stage};
pub use pipeline::{BatchOutcome, BatchRequest, BatchUnit, RatingPipeline};
pub use summary::{
    AnnualSummary, EnsembleSummary, NormalSummary, NowCastWindow, ProjectionLabel, SummaryTable,
};

//! End-to-end rating pipeline
//!
//! A [`RatingPipeline`] owns a validated configuration and the two cover
//! type reference distributions built from the historical series. The
//! references are built once and then shared, read-only, by every series
//! rated through the pipeline (historic runs, projections and now-casts).

pub mod batch;

pub use batch::{collect_table, run_batch, BatchOutcome, BatchRequest, BatchUnit};

use crate::config::{AggregationMode, RatingConfig};
use crate::core_types::cover::CoverType;
use crate::core_types::records::{ClassifiedSeries, DeficitSeries, RatedSeries, SmoothedSeries};
use crate::error::Result;
use crate::rating::{
    DangerClassifier, PercentileRater, ReferenceDistribution, SeasonalReferenceBuilder,
    SmoothedSeriesBuilder,
};
use crate::summary::{
    AnnualSummary, NormalSummary, NowCastWindow, ProjectionLabel, TemporalAggregator,
};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Configuration plus the reference distributions it produced
#[derive(Debug, Clone)]
pub struct RatingPipeline {
    config: RatingConfig,
    forest: ReferenceDistribution,
    non_forest: ReferenceDistribution,
    smoother: SmoothedSeriesBuilder,
}

impl RatingPipeline {
    /// Validate `config` and build both reference distributions from
    /// `history`.
    pub fn build(config: RatingConfig, history: &DeficitSeries) -> Result<Self> {
        config.validate()?;

        let reference = |cover_type: CoverType| -> Result<ReferenceDistribution> {
            let builder =
                SeasonalReferenceBuilder::new(config.season(cover_type), config.reference_period)?;
            Ok(builder.build(history, cover_type))
        };
        let forest = reference(CoverType::Forest)?;
        let non_forest = reference(CoverType::NonForest)?;
        let smoother = SmoothedSeriesBuilder::new(config.window_days)?;

        for distribution in [&forest, &non_forest] {
            if distribution.is_empty() {
                warn!(
                    "{} reference at {} is empty; rating against it will fail",
                    distribution.cover_type(),
                    config.site_id
                );
            }
        }
        info!(
            "Built references at {} from {} records: Forest {}, Non-Forest {} ({} {}-day window)",
            config.site_id,
            history.len(),
            forest.len(),
            non_forest.len(),
            config.model_version,
            config.window_days
        );

        Ok(Self {
            config,
            forest,
            non_forest,
            smoother,
        })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    pub fn reference(&self, cover_type: CoverType) -> &ReferenceDistribution {
        match cover_type {
            CoverType::Forest => &self.forest,
            CoverType::NonForest => &self.non_forest,
        }
    }

    pub fn smooth(&self, series: &DeficitSeries) -> Result<SmoothedSeries> {
        self.smoother.build(series)
    }

    /// Smooth and rate `series` against the cover type's reference
    pub fn rate(&self, series: &DeficitSeries, cover_type: CoverType) -> Result<RatedSeries> {
        let rater = PercentileRater::new(self.reference(cover_type), self.config.model_version)?;
        rater.rate(&self.smooth(series)?)
    }

    /// Smooth, rate and classify `series`
    pub fn classify(
        &self,
        series: &DeficitSeries,
        cover_type: CoverType,
    ) -> Result<ClassifiedSeries> {
        let rated = self.rate(series, cover_type)?;
        let classifier = DangerClassifier::for_model(cover_type, self.config.model_version);
        let classified = classifier.classify(&rated);
        info!(
            "Classified {} {} records at {}",
            classified.len(),
            cover_type,
            series.site_id()
        );
        Ok(classified)
    }

    /// Classify, then drop records dated after `as_of`.
    ///
    /// Smoothing still sees the full series so the first kept days have
    /// their complete trailing window.
    pub fn classify_as_of(
        &self,
        series: &DeficitSeries,
        cover_type: CoverType,
        as_of: NaiveDate,
    ) -> Result<ClassifiedSeries> {
        Ok(self.classify(series, cover_type)?.up_to(as_of))
    }

    /// Annual High/Medium/Low counts for `mode`
    pub fn annual(
        &self,
        series: &DeficitSeries,
        cover_type: CoverType,
        mode: AggregationMode,
    ) -> Result<Vec<AnnualSummary>> {
        let classified = self.classify(series, cover_type)?;
        TemporalAggregator::new(mode)?.annual(&classified)
    }

    /// Classify `series` and reduce it to a normal for `mode`
    pub fn summarize(
        &self,
        series: &DeficitSeries,
        cover_type: CoverType,
        mode: AggregationMode,
        projection: Option<&ProjectionLabel>,
    ) -> Result<NormalSummary> {
        let classified = self.classify(series, cover_type)?;
        TemporalAggregator::new(mode)?.summarize(&classified, projection)
    }

    /// Classify `series`, keep the now-cast window and summarize it as one
    /// bucket.
    pub fn now_cast(
        &self,
        series: &DeficitSeries,
        cover_type: CoverType,
        window: &NowCastWindow,
        projection: Option<&ProjectionLabel>,
    ) -> Result<NormalSummary> {
        let classified = self.classify(series, cover_type)?;
        let selected = window.select(&classified)?;
        info!(
            "Now-cast at {} from {}: {} of {} records in window",
            series.site_id(),
            window.today,
            selected.len(),
            classified.len()
        );
        TemporalAggregator::new(AggregationMode::NowCast)?.summarize(&selected, projection)
    }
}

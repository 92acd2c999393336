//! Parallel batch runs
//!
//! Each unit is one series plus one aggregation request. Units share the
//! pipeline's reference distributions read-only and run independently, so
//! one failing unit never stops the others.

use crate::config::AggregationMode;
use crate::core_types::cover::CoverType;
use crate::core_types::records::DeficitSeries;
use crate::error::Result;
use crate::pipeline::RatingPipeline;
use crate::summary::{NormalSummary, NowCastWindow, ProjectionLabel, SummaryTable};
use rayon::prelude::*;
use tracing::{info, warn};

/// What a batch unit reduces its classified series to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchRequest {
    Normal(AggregationMode),
    NowCast(NowCastWindow),
}

#[derive(Debug, Clone)]
pub struct BatchUnit {
    /// Free-form name used in logs, e.g. the source field name
    pub name: String,
    pub series: DeficitSeries,
    pub cover_type: CoverType,
    pub request: BatchRequest,
    /// `None` for historic and observed series
    pub projection: Option<ProjectionLabel>,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub name: String,
    pub result: Result<NormalSummary>,
}

impl BatchUnit {
    fn run(&self, pipeline: &RatingPipeline) -> Result<NormalSummary> {
        let projection = self.projection.as_ref();
        match &self.request {
            BatchRequest::Normal(mode) => {
                pipeline.summarize(&self.series, self.cover_type, *mode, projection)
            }
            BatchRequest::NowCast(window) => {
                pipeline.now_cast(&self.series, self.cover_type, window, projection)
            }
        }
    }
}

/// Run every unit in parallel. Outcomes are returned in unit order.
pub fn run_batch(pipeline: &RatingPipeline, units: &[BatchUnit]) -> Vec<BatchOutcome> {
    let outcomes: Vec<BatchOutcome> = units
        .par_iter()
        .map(|unit| {
            let result = unit.run(pipeline);
            if let Err(e) = &result {
                warn!("Batch unit '{}' ({}) failed: {}", unit.name, unit.cover_type, e);
            }
            BatchOutcome {
                name: unit.name.clone(),
                result,
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(
        "Batch finished: {} unit(s), {} succeeded, {} failed",
        outcomes.len(),
        outcomes.len() - failed,
        failed
    );
    outcomes
}

/// Table of the successful outcomes, with ensembles built over the
/// projection rows
pub fn collect_table(outcomes: &[BatchOutcome]) -> Result<SummaryTable> {
    let mut table = SummaryTable::new();
    table.extend(outcomes.iter().filter_map(|o| o.result.as_ref().ok().cloned()));
    table.build_ensembles()?;
    Ok(table)
}

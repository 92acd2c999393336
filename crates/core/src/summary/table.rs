//! Report table of normals and ensembles

use crate::error::Result;
use crate::summary::aggregate::NormalSummary;
use crate::summary::ensemble::{EnsembleAverager, EnsembleSummary};
use serde::{Deserialize, Serialize};

/// Normal and ensemble rows collected for one report.
///
/// The table is only a serializable container; writing it anywhere is up
/// to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub normals: Vec<NormalSummary>,
    pub ensembles: Vec<EnsembleSummary>,
}

impl SummaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, normal: NormalSummary) {
        self.normals.push(normal);
    }

    pub fn len(&self) -> usize {
        self.normals.len() + self.ensembles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normals.is_empty() && self.ensembles.is_empty()
    }

    /// Replace the ensemble rows with the grouped means of the current
    /// projection normals. Returns the number of ensembles built.
    pub fn build_ensembles(&mut self) -> Result<usize> {
        self.ensembles = EnsembleAverager::average_groups(&self.normals)?;
        Ok(self.ensembles.len())
    }

    /// Every row as a normal, ensembles after the individual runs
    pub fn rows(&self) -> impl Iterator<Item = &NormalSummary> {
        self.normals
            .iter()
            .chain(self.ensembles.iter().map(|e| &e.summary))
    }
}

impl Extend<NormalSummary> for SummaryTable {
    fn extend<I: IntoIterator<Item = NormalSummary>>(&mut self, iter: I) {
        self.normals.extend(iter);
    }
}

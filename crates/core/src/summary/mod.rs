//! Annual counts, normals, now-cast windows and ensembles

pub mod aggregate;
pub mod ensemble;
pub mod nowcast;
pub mod projection;
pub mod table;

pub use aggregate::{
    trailing_normals, yearly_normals, AnnualSummary, NormalSummary, TemporalAggregator,
};
pub use ensemble::{EnsembleAverager, EnsembleSummary};
pub use nowcast::{NowCastWindow, DEFAULT_HORIZON_DAYS};
pub use projection::{ProjectionLabel, ENSEMBLE_GCM};
pub use table::SummaryTable;

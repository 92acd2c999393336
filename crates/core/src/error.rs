//! Error taxonomy for the ignition-potential pipeline.
//!
//! Every stage validates its own preconditions and fails fast with an
//! [`IgnitionError`] naming the stage and the offending value. Stages never
//! attempt partial recovery; batch callers decide per unit whether to continue
//! (see [`crate::pipeline::run_batch`]).

use std::fmt;
use thiserror::Error;

/// Pipeline stage that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Configuration loading and validation
    Config,
    /// Input series construction
    Input,
    /// Seasonal reference distribution construction
    Reference,
    /// Trailing moving average
    Smoothing,
    /// Percentile and ignition-proportion rating
    Rating,
    /// High/Medium/Low classification
    Classification,
    /// Annual and normal aggregation
    Aggregation,
    /// Ensemble averaging across projections
    Ensemble,
    /// Projection field-name parsing
    Projection,
    /// Now-cast window selection
    NowCast,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Input => "input",
            Stage::Reference => "reference",
            Stage::Smoothing => "smoothing",
            Stage::Rating => "rating",
            Stage::Classification => "classification",
            Stage::Aggregation => "aggregation",
            Stage::Ensemble => "ensemble",
            Stage::Projection => "projection",
            Stage::NowCast => "now-cast",
        };
        f.write_str(name)
    }
}

/// Errors raised by the rating and aggregation stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IgnitionError {
    /// Invalid thresholds, unknown statistic/time step, inverted windows.
    #[error("configuration error in {stage} stage: {message}")]
    Configuration { stage: Stage, message: String },

    /// Empty reference distribution, empty ensemble, malformed input.
    #[error("data error in {stage} stage: {message}")]
    Data { stage: Stage, message: String },

    /// Arithmetic that would otherwise yield NaN or infinity.
    #[error("computation error in {stage} stage: {message}")]
    Computation { stage: Stage, message: String },
}

impl IgnitionError {
    pub(crate) fn configuration(stage: Stage, message: impl Into<String>) -> Self {
        Self::Configuration {
            stage,
            message: message.into(),
        }
    }

    pub(crate) fn data(stage: Stage, message: impl Into<String>) -> Self {
        Self::Data {
            stage,
            message: message.into(),
        }
    }

    pub(crate) fn computation(stage: Stage, message: impl Into<String>) -> Self {
        Self::Computation {
            stage,
            message: message.into(),
        }
    }

    /// Stage that raised this error.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Configuration { stage, .. }
            | Self::Data { stage, .. }
            | Self::Computation { stage, .. } => *stage,
        }
    }

    /// Human-readable message without the stage prefix.
    pub fn msg(&self) -> &str {
        match self {
            Self::Configuration { message, .. }
            | Self::Data { message, .. }
            | Self::Computation { message, .. } => message,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, IgnitionError>;

//! Vegetation cover types and calibrated ignition model versions
//!
//! All cover-type dispatch goes through [`ModelParameters::lookup`]; nothing
//! else in the crate compares cover-type labels.

use crate::error::{IgnitionError, Result, Stage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vegetation cover type a rating applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoverType {
    /// Forested vegetation
    Forest,
    /// Grassland and shrub (non-forested) vegetation
    NonForest,
}

impl CoverType {
    /// Both cover types in reporting order
    pub const ALL: [CoverType; 2] = [CoverType::Forest, CoverType::NonForest];

    /// Report label
    pub fn label(&self) -> &'static str {
        match self {
            CoverType::Forest => "Forest",
            CoverType::NonForest => "Non-Forest",
        }
    }
}

impl fmt::Display for CoverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CoverType {
    type Err = IgnitionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "forest" => Ok(CoverType::Forest),
            "non-forest" | "nonforest" | "grassland" => Ok(CoverType::NonForest),
            other => Err(IgnitionError::configuration(
                Stage::Config,
                format!("cover type '{other}' is not 'Forest' or 'Non-Forest'"),
            )),
        }
    }
}

/// Calibrated ignition model version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelVersion {
    /// Legacy percentile model (Southern Rockies, 2020 calibration)
    V1,
    /// Current fire-occurrence model (2023 calibration)
    #[default]
    V2,
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVersion::V1 => f.write_str("v1"),
            ModelVersion::V2 => f.write_str("v2"),
        }
    }
}

impl FromStr for ModelVersion {
    type Err = IgnitionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "v1" | "1" => Ok(ModelVersion::V1),
            "v2" | "2" => Ok(ModelVersion::V2),
            other => Err(IgnitionError::configuration(
                Stage::Config,
                format!("model version '{other}' is not 'v1' or 'v2'"),
            )),
        }
    }
}

/// Calibrated constants for one cover type under one model version.
///
/// Ignition proportion is `coefficient * exp(exponent * p)` with `p` on the
/// 0-100 percentile scale. Ratings are High above `high_threshold`, Medium
/// above `medium_threshold`, Low otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParameters {
    pub coefficient: f64,
    pub exponent: f64,
    pub high_threshold: f64,
    pub medium_threshold: f64,
}

const FOREST_V1: ModelParameters = ModelParameters {
    coefficient: 0.368,
    exponent: 0.055,
    high_threshold: 86.0,
    medium_threshold: 65.0,
};

const NON_FOREST_V1: ModelParameters = ModelParameters {
    coefficient: 0.047,
    exponent: 0.075,
    high_threshold: 90.0,
    medium_threshold: 73.0,
};

const FOREST_V2: ModelParameters = ModelParameters {
    coefficient: 0.0095308,
    exponent: 4.4556479,
    high_threshold: 84.0,
    medium_threshold: 53.0,
};

const NON_FOREST_V2: ModelParameters = ModelParameters {
    coefficient: 0.0119265,
    exponent: 4.192916,
    high_threshold: 84.0,
    medium_threshold: 51.0,
};

impl ModelParameters {
    /// Look up the calibrated constants for a cover type and model version
    #[must_use]
    pub const fn lookup(cover_type: CoverType, version: ModelVersion) -> &'static ModelParameters {
        match (cover_type, version) {
            (CoverType::Forest, ModelVersion::V1) => &FOREST_V1,
            (CoverType::NonForest, ModelVersion::V1) => &NON_FOREST_V1,
            (CoverType::Forest, ModelVersion::V2) => &FOREST_V2,
            (CoverType::NonForest, ModelVersion::V2) => &NON_FOREST_V2,
        }
    }
}

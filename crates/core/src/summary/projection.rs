//! Climate projection labels parsed from projection field names
//!
//! Projection columns are named `<variable>_<GCM>_<rcp>`, for example
//! `deficit_CanESM2_rcp45` or `deficit_CSIRO-Mk3-6-0_rcp85`.

use crate::error::{IgnitionError, Result, Stage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GCM identifier used for multi-model ensemble rows
pub const ENSEMBLE_GCM: &str = "Ensemble";

/// Variable, climate model and emissions scenario of a projection series
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectionLabel {
    pub variable: String,
    pub gcm: String,
    pub rcp: String,
}

impl ProjectionLabel {
    pub fn new(
        variable: impl Into<String>,
        gcm: impl Into<String>,
        rcp: impl Into<String>,
    ) -> Self {
        Self {
            variable: variable.into(),
            gcm: gcm.into(),
            rcp: rcp.into(),
        }
    }

    /// Whether this series is itself a precomputed ensemble
    pub fn is_ensemble(&self) -> bool {
        self.gcm.eq_ignore_ascii_case(ENSEMBLE_GCM)
    }
}

impl FromStr for ProjectionLabel {
    type Err = IgnitionError;

    fn from_str(field: &str) -> Result<Self> {
        let malformed = |why: &str| {
            IgnitionError::data(
                Stage::Projection,
                format!("projection field '{field}' {why}; expected <variable>_<GCM>_<rcp>"),
            )
        };

        let (variable, rest) = field.split_once('_').ok_or_else(|| malformed("has no '_'"))?;
        let (gcm, rcp) = rest.rsplit_once('_').ok_or_else(|| malformed("has no scenario"))?;

        if variable.is_empty() || gcm.is_empty() {
            return Err(malformed("has an empty segment"));
        }
        let is_rcp = match (rcp.get(..3), rcp.get(3..)) {
            (Some(prefix), Some(digits)) => {
                prefix.eq_ignore_ascii_case("rcp")
                    && !digits.is_empty()
                    && digits.bytes().all(|b| b.is_ascii_digit())
            }
            _ => false,
        };
        if !is_rcp {
            return Err(malformed("does not end in an rcp scenario"));
        }

        Ok(Self::new(variable, gcm, rcp.to_lowercase()))
    }
}

impl fmt::Display for ProjectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.variable, self.gcm, self.rcp)
    }
}

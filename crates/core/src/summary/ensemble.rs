//! Multi-model ensemble means of normals

use crate::core_types::cover::CoverType;
use crate::error::{IgnitionError, Result, Stage};
use crate::summary::aggregate::NormalSummary;
use crate::summary::projection::ENSEMBLE_GCM;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Normal whose means are averaged over several climate models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    /// GCM is always `"Ensemble"`
    pub summary: NormalSummary,
    /// Number of member normals averaged
    pub members: usize,
}

/// Averages normals that share site, cover type, scenario and era
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsembleAverager;

impl EnsembleAverager {
    /// Column-wise mean of `rows`.
    ///
    /// Fails with a data error if `rows` is empty or the rows do not share
    /// site, cover type, RCP and era.
    pub fn average(rows: &[NormalSummary]) -> Result<EnsembleSummary> {
        let first = rows.first().ok_or_else(|| {
            IgnitionError::data(Stage::Ensemble, "cannot average an empty set of normals")
        })?;
        if let Some(other) = rows.iter().find(|r| group_key(r) != group_key(first)) {
            return Err(IgnitionError::data(
                Stage::Ensemble,
                format!(
                    "ensemble members disagree: {} {} {} {} vs {} {} {} {}",
                    first.site_id,
                    first.cover_type,
                    first.rcp_label(),
                    first.date_range,
                    other.site_id,
                    other.cover_type,
                    other.rcp_label(),
                    other.date_range
                ),
            ));
        }

        let n = rows.len() as f64;
        let mean = |field: fn(&NormalSummary) -> f64| rows.iter().map(field).sum::<f64>() / n;

        Ok(EnsembleSummary {
            summary: NormalSummary {
                site_id: first.site_id.clone(),
                cover_type: first.cover_type,
                date_range: first.date_range.clone(),
                rcp: first.rcp.clone(),
                gcm: Some(ENSEMBLE_GCM.to_owned()),
                high_mean: mean(|r| r.high_mean),
                medium_mean: mean(|r| r.medium_mean),
                low_mean: mean(|r| r.low_mean),
                now_cast_count: None,
            },
            members: rows.len(),
        })
    }

    /// One ensemble per (site, cover type, RCP, era) group in `rows`.
    ///
    /// Rows without an RCP (historic runs) and rows that are already
    /// ensembles are skipped. Output is sorted by site, cover type, RCP and era.
    pub fn average_groups(rows: &[NormalSummary]) -> Result<Vec<EnsembleSummary>> {
        let mut groups: FxHashMap<GroupKey<'_>, Vec<NormalSummary>> = FxHashMap::default();
        for row in rows {
            let is_member = row.rcp.is_some()
                && !row
                    .gcm
                    .as_deref()
                    .is_some_and(|g| g.eq_ignore_ascii_case(ENSEMBLE_GCM));
            if is_member {
                groups.entry(group_key(row)).or_default().push(row.clone());
            }
        }

        let mut keys: Vec<_> = groups.keys().copied().collect();
        keys.sort_unstable();
        let ensembles = keys
            .into_iter()
            .map(|key| Self::average(&groups[&key]))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Built {} ensemble(s) from {} normal(s)",
            ensembles.len(),
            rows.len()
        );
        Ok(ensembles)
    }
}

type GroupKey<'a> = (&'a str, CoverType, Option<&'a str>, &'a str);

fn group_key(row: &NormalSummary) -> GroupKey<'_> {
    (
        row.site_id.as_str(),
        row.cover_type,
        row.rcp.as_deref(),
        row.date_range.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn normal(gcm: &str, rcp: Option<&str>, era: &str, high: f64) -> NormalSummary {
        NormalSummary {
            site_id: "FLFOForest_1".into(),
            cover_type: CoverType::Forest,
            date_range: era.into(),
            rcp: rcp.map(str::to_owned),
            gcm: Some(gcm.to_owned()),
            high_mean: high,
            medium_mean: high / 2.0,
            low_mean: 365.0 - high * 1.5,
            now_cast_count: None,
        }
    }

    #[test]
    fn test_single_member_is_identity() {
        let row = normal("CanESM2", Some("rcp45"), "2031_2060", 41.3);
        let ensemble = EnsembleAverager::average(std::slice::from_ref(&row)).unwrap();
        assert_eq!(ensemble.members, 1);
        assert_eq!(ensemble.summary.high_mean, row.high_mean);
        assert_eq!(ensemble.summary.medium_mean, row.medium_mean);
        assert_eq!(ensemble.summary.low_mean, row.low_mean);
        assert_eq!(ensemble.summary.gcm_label(), "Ensemble");
    }

    #[test]
    fn test_mean_across_models() {
        let rows = [
            normal("CanESM2", Some("rcp85"), "2061_2090", 40.0),
            normal("CCSM4", Some("rcp85"), "2061_2090", 50.0),
            normal("MIROC5", Some("rcp85"), "2061_2090", 66.0),
        ];
        let ensemble = EnsembleAverager::average(&rows).unwrap();
        assert_relative_eq!(ensemble.summary.high_mean, 52.0);
        assert_relative_eq!(ensemble.summary.medium_mean, 26.0);
        assert_eq!(ensemble.summary.rcp_label(), "rcp85");
        assert_eq!(ensemble.summary.date_range, "2061_2090");
    }

    #[test]
    fn test_empty_input_is_a_data_error() {
        let err = EnsembleAverager::average(&[]).unwrap_err();
        assert!(matches!(err, IgnitionError::Data { stage: Stage::Ensemble, .. }));
    }

    #[test]
    fn test_mixed_scenarios_rejected() {
        let rows = [
            normal("CanESM2", Some("rcp45"), "2031_2060", 40.0),
            normal("CanESM2", Some("rcp85"), "2031_2060", 50.0),
        ];
        assert!(EnsembleAverager::average(&rows).is_err());
    }

    #[test]
    fn test_grouping_skips_historic_and_precomputed_ensembles() {
        let rows = vec![
            normal("na", None, "1991_2020", 30.0),
            normal("CanESM2", Some("rcp45"), "2031_2060", 40.0),
            normal("CCSM4", Some("rcp45"), "2031_2060", 60.0),
            normal("Ensemble", Some("rcp45"), "2031_2060", 999.0),
            normal("CanESM2", Some("rcp85"), "2031_2060", 70.0),
            normal("CanESM2", Some("rcp45"), "2061_2090", 80.0),
        ];
        let ensembles = EnsembleAverager::average_groups(&rows).unwrap();
        let summary: Vec<_> = ensembles
            .iter()
            .map(|e| {
                (
                    e.summary.rcp_label().to_owned(),
                    e.summary.date_range.clone(),
                    e.members,
                    e.summary.high_mean,
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("rcp45".to_owned(), "2031_2060".to_owned(), 2, 50.0),
                ("rcp45".to_owned(), "2061_2090".to_owned(), 1, 80.0),
                ("rcp85".to_owned(), "2031_2060".to_owned(), 1, 70.0),
            ]
        );
    }
}

// Data models for curated cohort statistics

use serde::{Deserialize, Serialize};

use crate::error::Rejection;
use crate::framework::coerce::{flag, float, integer, required_positive_integer, required_text, text};

/// One CSV row as written by the curator; every cell is optional text
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCohort {
    pub cohort_name: Option<String>,
    pub source_citation: Option<String>,
    pub modality: Option<String>,
    pub condition: Option<String>,
    pub setting: Option<String>,
    pub n_participants: Option<String>,
    pub country: Option<String>,
    pub instrument: Option<String>,
    pub baseline_mean: Option<String>,
    pub baseline_sd: Option<String>,
    pub endpoint_mean: Option<String>,
    pub endpoint_sd: Option<String>,
    pub followup_weeks: Option<String>,
    pub response_rate_pct: Option<String>,
    pub remission_rate_pct: Option<String>,
    pub effect_size_hedges_g: Option<String>,
    pub adverse_event_rate_pct: Option<String>,
    pub data_freely_usable: Option<String>,
    pub license: Option<String>,
    pub notes: Option<String>,
}

/// Row for the `benchmark_cohorts` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRow {
    /// Empty when the curator left it blank
    pub cohort_name: String,
    pub source_citation: String,
    pub modality: String,
    pub condition: String,
    pub setting: Option<String>,
    pub n_participants: i64,
    pub country: Option<String>,
    pub instrument: String,
    pub baseline_mean: Option<f64>,
    pub baseline_sd: Option<f64>,
    pub endpoint_mean: Option<f64>,
    pub endpoint_sd: Option<f64>,
    pub followup_weeks: Option<i64>,
    pub response_rate_pct: Option<f64>,
    pub remission_rate_pct: Option<f64>,
    pub effect_size_hedges_g: Option<f64>,
    pub adverse_event_rate_pct: Option<f64>,
    pub data_freely_usable: bool,
    pub license: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<&RawCohort> for CohortRow {
    type Error = Rejection;

    fn try_from(raw: &RawCohort) -> Result<Self, Self::Error> {
        // Citation integrity: no row without provenance
        let source_citation = required_text(raw.source_citation.as_deref(), "source_citation")?;
        let n_participants =
            required_positive_integer(raw.n_participants.as_deref(), "n_participants")?;
        let modality = required_text(raw.modality.as_deref(), "modality")?.to_lowercase();
        let condition = required_text(raw.condition.as_deref(), "condition")?;
        let instrument = required_text(raw.instrument.as_deref(), "instrument")?;

        Ok(Self {
            cohort_name: text(raw.cohort_name.as_deref()).unwrap_or_default(),
            source_citation,
            modality,
            condition,
            setting: text(raw.setting.as_deref()),
            n_participants,
            country: text(raw.country.as_deref()),
            instrument,
            baseline_mean: float(raw.baseline_mean.as_deref()),
            baseline_sd: float(raw.baseline_sd.as_deref()),
            endpoint_mean: float(raw.endpoint_mean.as_deref()),
            endpoint_sd: float(raw.endpoint_sd.as_deref()),
            followup_weeks: integer(raw.followup_weeks.as_deref()),
            response_rate_pct: float(raw.response_rate_pct.as_deref()),
            remission_rate_pct: float(raw.remission_rate_pct.as_deref()),
            effect_size_hedges_g: float(raw.effect_size_hedges_g.as_deref()),
            adverse_event_rate_pct: float(raw.adverse_event_rate_pct.as_deref()),
            data_freely_usable: flag(raw.data_freely_usable.as_deref()),
            license: text(raw.license.as_deref()),
            notes: text(raw.notes.as_deref()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn valid() -> RawCohort {
        RawCohort {
            cohort_name: Some("COMP360 25mg arm".to_string()),
            source_citation: Some("Goodwin et al. 2022, NEJM".to_string()),
            modality: Some(" Psilocybin ".to_string()),
            condition: Some("TRD".to_string()),
            n_participants: Some("79".to_string()),
            instrument: Some("MADRS".to_string()),
            baseline_mean: Some("31.9".to_string()),
            followup_weeks: Some("12.0".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_row() {
        let row = CohortRow::try_from(&valid()).unwrap();
        assert_eq!(row.modality, "psilocybin");
        assert_eq!(row.n_participants, 79);
        assert_eq!(row.baseline_mean, Some(31.9));
        assert_eq!(row.followup_weeks, Some(12));
        assert_eq!(row.endpoint_mean, None);
        assert!(row.data_freely_usable);
        assert_eq!(row.setting, None);
    }

    #[test]
    fn test_blank_citation_rejects_row() {
        let raw = RawCohort {
            source_citation: Some("   ".to_string()),
            ..valid()
        };
        assert_eq!(
            CohortRow::try_from(&raw),
            Err(Rejection::MissingRequiredField("source_citation"))
        );
    }

    #[test]
    fn test_blank_optional_numeric_is_null_not_zero() {
        let raw = RawCohort {
            baseline_sd: Some(String::new()),
            effect_size_hedges_g: Some("n/a".to_string()),
            ..valid()
        };
        let row = CohortRow::try_from(&raw).unwrap();
        assert_eq!(row.baseline_sd, None);
        assert_eq!(row.effect_size_hedges_g, None);
    }

    #[test]
    fn test_required_fields_checked_in_order() {
        let raw = RawCohort {
            instrument: None,
            condition: None,
            ..valid()
        };
        assert_eq!(
            CohortRow::try_from(&raw),
            Err(Rejection::MissingRequiredField("condition"))
        );
    }

    #[test]
    fn test_usable_flag_false_literal() {
        let raw = RawCohort {
            data_freely_usable: Some("No".to_string()),
            ..valid()
        };
        assert!(!CohortRow::try_from(&raw).unwrap().data_freely_usable);
    }
}

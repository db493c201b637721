// Data models for ClinicalTrials.gov API v2 studies

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{SOURCE_LABEL, TITLE_MAX_CHARS};
use crate::error::Rejection;
use crate::framework::coerce::{json_integer, text, truncate_chars};

/// The subset of a study document requested through the `fields` projection
///
/// Every level is optional: the registry omits modules it has nothing for.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStudy {
    pub protocol_section: ProtocolSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtocolSection {
    pub identification_module: IdentificationModule,
    pub status_module: StatusModule,
    pub design_module: DesignModule,
    pub conditions_module: ConditionsModule,
    pub outcomes_module: OutcomesModule,
    pub contacts_locations_module: ContactsLocationsModule,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentificationModule {
    pub nct_id: Option<String>,
    pub brief_title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusModule {
    pub overall_status: Option<String>,
    pub start_date_struct: Option<DateStruct>,
    pub completion_date_struct: Option<DateStruct>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DateStruct {
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignModule {
    pub phases: Option<Vec<String>>,
    pub enrollment_info: Option<EnrollmentInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrollmentInfo {
    pub count: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConditionsModule {
    pub conditions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutcomesModule {
    pub primary_outcomes: Option<Vec<Outcome>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Outcome {
    pub measure: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactsLocationsModule {
    pub locations: Option<Vec<Location>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Location {
    pub country: Option<String>,
}

/// A study as discovered by one modality search
#[derive(Debug, Clone)]
pub struct StudyRecord {
    pub modality: &'static str,
    pub term: String,
    pub study: Value,
}

impl StudyRecord {
    /// NCT number if the document carries one, for log lines
    pub fn nct_id(&self) -> Option<&str> {
        self.study
            .pointer("/protocolSection/identificationModule/nctId")
            .and_then(Value::as_str)
    }
}

/// Row for the `benchmark_trials` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRow {
    pub nct_id: String,
    pub title: String,
    pub phase: Option<String>,
    pub status: Option<String>,
    pub modality: String,
    pub conditions: Vec<String>,
    pub country: Option<String>,
    pub enrollment_actual: Option<i64>,
    pub start_date: Option<String>,
    pub completion_date: Option<String>,
    pub primary_outcome_measure: Option<String>,
    pub source: &'static str,
}

impl TryFrom<&StudyRecord> for TrialRow {
    type Error = Rejection;

    fn try_from(record: &StudyRecord) -> Result<Self, Self::Error> {
        let raw: RawStudy = serde_json::from_value(record.study.clone())
            .map_err(|e| Rejection::invalid("protocolSection", e.to_string()))?;
        let proto = raw.protocol_section;

        let nct_id = text(proto.identification_module.nct_id.as_deref())
            .ok_or(Rejection::MissingPrimaryIdentifier)?;
        let title = text(proto.identification_module.brief_title.as_deref())
            .ok_or(Rejection::MissingRequiredField("title"))?;

        let first = |values: Option<Vec<String>>| values.and_then(|v| v.into_iter().next());

        Ok(Self {
            nct_id,
            title: truncate_chars(&title, TITLE_MAX_CHARS),
            phase: first(proto.design_module.phases),
            status: text(proto.status_module.overall_status.as_deref()),
            modality: record.modality.to_string(),
            conditions: proto.conditions_module.conditions.unwrap_or_default(),
            country: proto
                .contacts_locations_module
                .locations
                .and_then(|l| l.into_iter().next())
                .and_then(|l| text(l.country.as_deref())),
            enrollment_actual: json_integer(
                proto
                    .design_module
                    .enrollment_info
                    .as_ref()
                    .and_then(|e| e.count.as_ref()),
            ),
            start_date: proto
                .status_module
                .start_date_struct
                .and_then(|d| d.date)
                .and_then(|d| registry_date(&d)),
            completion_date: proto
                .status_module
                .completion_date_struct
                .and_then(|d| d.date)
                .and_then(|d| registry_date(&d)),
            primary_outcome_measure: proto
                .outcomes_module
                .primary_outcomes
                .and_then(|o| o.into_iter().next())
                .and_then(|o| text(o.measure.as_deref())),
            source: SOURCE_LABEL,
        })
    }
}

/// Normalize a registry date to `YYYY-MM-DD`
///
/// The registry reports either a full date or a month (`YYYY-MM`); months are
/// pinned to their first day. Anything else is dropped.
pub fn registry_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d"))
        .ok()?;
    Some(date.format("%Y-%m-%d").to_string())
}

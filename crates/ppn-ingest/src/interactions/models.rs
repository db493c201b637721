// Data models for TripSit drug combinations

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::{DEFAULT_NOTE, EVIDENCE_SOURCE, INTERACTOR_CATEGORY, SOURCE_URL};
use crate::error::Rejection;
use crate::framework::coerce::{json_text, text};

/// One `drug_a → drug_b` entry of the combos document
#[derive(Debug, Clone, PartialEq)]
pub struct ComboRecord {
    pub drug_a: String,
    /// `None` when `drug_a`'s entry is not an object of combinations
    pub drug_b: Option<String>,
    /// `{status, note}` as published; anything else is tolerated
    pub details: Value,
}

/// Portal severity scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SeverityGrade {
    Low,
    Moderate,
    High,
    #[serde(rename = "Life-Threatening")]
    LifeThreatening,
}

impl SeverityGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::LifeThreatening => "Life-Threatening",
        }
    }
}

impl fmt::Display for SeverityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map a TripSit status label to a severity grade and 1-10 risk level
///
/// Unknown or missing labels are treated as low risk.
pub fn severity_for(status: &str) -> (SeverityGrade, u8) {
    match status {
        "Low Risk & Synergy" => (SeverityGrade::Low, 2),
        "Low Risk & No Synergy" => (SeverityGrade::Low, 1),
        "Low Risk & Decrease" => (SeverityGrade::Low, 2),
        "Caution" => (SeverityGrade::Moderate, 5),
        "Unsafe" => (SeverityGrade::High, 8),
        "Dangerous" => (SeverityGrade::LifeThreatening, 10),
        _ => (SeverityGrade::Low, 1),
    }
}

/// Trim and title-case a drug name: every letter that follows a
/// non-letter is upper-cased, every other letter lower-cased
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut after_letter = false;
    for c in name.trim().chars() {
        if c.is_alphabetic() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(c);
            after_letter = false;
        }
    }
    out
}

/// Row for the `ref_clinical_interactions` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionRow {
    pub substance_name: String,
    pub interactor_name: String,
    pub interactor_category: &'static str,
    pub risk_level: u8,
    pub severity_grade: SeverityGrade,
    pub clinical_description: String,
    pub mechanism: Option<String>,
    pub evidence_source: &'static str,
    pub source_url: &'static str,
    /// Community data is never peer-reviewed
    pub is_verified: bool,
}

impl TryFrom<&ComboRecord> for InteractionRow {
    type Error = Rejection;

    fn try_from(record: &ComboRecord) -> Result<Self, Self::Error> {
        let drug_b = record
            .drug_b
            .as_deref()
            .ok_or_else(|| Rejection::invalid("interactions", record.details.to_string()))?;

        let substance_name = title_case(&record.drug_a);
        let interactor_name = title_case(drug_b);
        if substance_name.is_empty() || interactor_name.is_empty() {
            return Err(Rejection::MissingPrimaryIdentifier);
        }

        let status = json_text(record.details.get("status")).unwrap_or_default();
        let (severity_grade, risk_level) = severity_for(&status);
        let note = record
            .details
            .get("note")
            .and_then(Value::as_str)
            .and_then(|n| text(Some(n)))
            .unwrap_or_else(|| DEFAULT_NOTE.to_string());

        Ok(Self {
            substance_name,
            interactor_name,
            interactor_category: INTERACTOR_CATEGORY,
            risk_level,
            severity_grade,
            clinical_description: note,
            mechanism: None,
            evidence_source: EVIDENCE_SOURCE,
            source_url: SOURCE_URL,
            is_verified: false,
        })
    }
}

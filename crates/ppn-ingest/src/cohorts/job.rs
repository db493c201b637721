// Cohorts ingestion job

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ppn_common::ConfigError;
use tracing::info;

use super::models::CohortRow;
use super::reader::{read_cohorts, CohortLine};
use super::{BATCH_SIZE, TABLE};
use crate::error::{Rejection, Result};
use crate::framework::{EntityKey, IngestJob, RunReport, SourceBatch};

/// Seeds `benchmark_cohorts` from the curated CSV
#[derive(Debug)]
pub struct CohortsJob {
    path: PathBuf,
}

impl CohortsJob {
    /// Job over a file that may not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Job over a file the operator named explicitly; it must exist
    pub fn from_explicit_path(path: impl Into<PathBuf>) -> std::result::Result<Self, ConfigError> {
        let path = path.into();
        if !path.is_file() {
            return Err(ConfigError::MissingInput(path.display().to_string()));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl IngestJob for CohortsJob {
    type Raw = CohortLine;
    type Row = CohortRow;

    fn name(&self) -> &'static str {
        "cohorts"
    }

    fn table(&self) -> &'static str {
        TABLE
    }

    fn conflict_key(&self) -> Option<&'static str> {
        None
    }

    fn batch_size(&self) -> usize {
        BATCH_SIZE
    }

    async fn fetch(&self, _report: &mut RunReport) -> Result<SourceBatch<CohortLine>> {
        match read_cohorts(&self.path).await? {
            Some(lines) => {
                info!(path = %self.path.display(), lines = lines.len(), "Read cohorts CSV");
                Ok(SourceBatch::Records(lines))
            },
            None => Ok(SourceBatch::Unavailable {
                reason: format!("{} has not been curated yet", self.path.display()),
            }),
        }
    }

    fn raw_label(&self, raw: &CohortLine) -> String {
        match &raw.record {
            Ok(cohort) => format!(
                "row {} ('{}')",
                raw.line,
                cohort.cohort_name.as_deref().unwrap_or("?")
            ),
            Err(_) => format!("row {}", raw.line),
        }
    }

    fn normalize(&self, raw: &CohortLine) -> std::result::Result<CohortRow, Rejection> {
        match &raw.record {
            Ok(cohort) => CohortRow::try_from(cohort),
            Err(e) => Err(Rejection::invalid("record", e.clone())),
        }
    }

    /// One arm of one study, measured with one instrument at one timepoint
    fn entity_key(&self, row: &CohortRow) -> EntityKey {
        let text = [
            &row.source_citation,
            &row.cohort_name,
            &row.modality,
            &row.condition,
            &row.instrument,
        ]
        .map(|part| part.trim().to_lowercase());

        EntityKey::composite(text.into_iter().chain([
            row.n_participants.to_string(),
            row.followup_weeks.map(|w| w.to_string()).unwrap_or_default(),
        ]))
    }

    fn category(&self, row: &CohortRow) -> String {
        row.modality.clone()
    }

    fn preview(&self, row: &CohortRow) -> String {
        let name: String = row.cohort_name.chars().take(50).collect();
        format!(
            "{:50} | {:12} | {:10} | n={} | {}",
            name, row.modality, row.condition, row.n_participants, row.instrument
        )
    }
}

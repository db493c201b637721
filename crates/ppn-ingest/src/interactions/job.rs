// Interactions ingestion job

use async_trait::async_trait;
use tracing::info;

use super::fetcher::TripSitSource;
use super::models::{ComboRecord, InteractionRow};
use super::{BATCH_SIZE, CONFLICT_KEY, NAME_SOURCES, TABLE};
use crate::config::IngestConfig;
use crate::error::{FetchError, Rejection, Result};
use crate::framework::{EntityKey, IngestJob, NameSource, RunReport, SourceBatch};

/// Seeds `ref_clinical_interactions` from the TripSit chart
pub struct InteractionsJob {
    source: TripSitSource,
}

impl InteractionsJob {
    pub fn new(source: TripSitSource) -> Self {
        Self { source }
    }

    pub fn from_config(config: &IngestConfig, client: reqwest::Client) -> Self {
        Self::new(TripSitSource::new(client, config.tripsit_combos_url.clone()))
    }
}

#[async_trait]
impl IngestJob for InteractionsJob {
    type Raw = ComboRecord;
    type Row = InteractionRow;

    fn name(&self) -> &'static str {
        "interactions"
    }

    fn table(&self) -> &'static str {
        TABLE
    }

    fn conflict_key(&self) -> Option<&'static str> {
        Some(CONFLICT_KEY)
    }

    fn batch_size(&self) -> usize {
        BATCH_SIZE
    }

    fn name_sources(&self) -> &[NameSource] {
        &NAME_SOURCES
    }

    async fn fetch(&self, report: &mut RunReport) -> Result<SourceBatch<ComboRecord>> {
        info!(url = self.source.url(), "Fetching TripSit combinations");
        match self.source.fetch_combos().await {
            Ok(records) => {
                info!(combos = records.len(), "Fetched TripSit combinations");
                Ok(SourceBatch::Records(records))
            },
            Err(cause) => {
                report.record_fetch_error(FetchError {
                    term: self.source.url().to_string(),
                    page: 1,
                    cause,
                });
                Ok(SourceBatch::Records(Vec::new()))
            },
        }
    }

    fn raw_label(&self, raw: &ComboRecord) -> String {
        format!("{} + {}", raw.drug_a, raw.drug_b.as_deref().unwrap_or("?"))
    }

    fn normalize(&self, raw: &ComboRecord) -> std::result::Result<InteractionRow, Rejection> {
        InteractionRow::try_from(raw)
    }

    fn entity_key(&self, row: &InteractionRow) -> EntityKey {
        EntityKey::pair(&row.substance_name, &row.interactor_name)
    }

    fn names<'r>(&self, row: &'r InteractionRow) -> Vec<&'r str> {
        vec![row.substance_name.as_str(), row.interactor_name.as_str()]
    }

    fn category(&self, row: &InteractionRow) -> String {
        row.severity_grade.to_string()
    }

    fn preview(&self, row: &InteractionRow) -> String {
        format!(
            "{} + {} → {} (risk {})",
            row.substance_name, row.interactor_name, row.severity_grade, row.risk_level
        )
    }
}

// Trials ingestion job

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::fetcher::CtGovSource;
use super::models::{StudyRecord, TrialRow};
use super::{BATCH_SIZE, CONFLICT_KEY, MODALITY_SEARCHES, TABLE};
use crate::config::IngestConfig;
use crate::error::{Rejection, Result};
use crate::framework::pager::{harvest, PageSource, DEFAULT_PAGE_DELAY};
use crate::framework::{EntityKey, IngestJob, RunReport, SourceBatch};

/// Seeds `benchmark_trials` from the registry
pub struct TrialsJob<S = CtGovSource> {
    source: S,
    searches: &'static [(&'static str, &'static [&'static str])],
    page_delay: Duration,
}

impl TrialsJob<CtGovSource> {
    pub fn from_config(config: &IngestConfig, client: reqwest::Client) -> Self {
        Self::new(CtGovSource::new(client, config.trials_api_url.clone()))
    }
}

impl<S> TrialsJob<S>
where
    S: PageSource<Item = serde_json::Value>,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            searches: MODALITY_SEARCHES,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }

    /// Restrict the run to a custom modality map
    pub fn with_searches(
        mut self,
        searches: &'static [(&'static str, &'static [&'static str])],
    ) -> Self {
        self.searches = searches;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }
}

#[async_trait]
impl<S> IngestJob for TrialsJob<S>
where
    S: PageSource<Item = serde_json::Value>,
{
    type Raw = StudyRecord;
    type Row = TrialRow;

    fn name(&self) -> &'static str {
        "trials"
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

    async fn fetch(&self, report: &mut RunReport) -> Result<SourceBatch<StudyRecord>> {
        let mut records = Vec::new();

        for &(modality, terms) in self.searches {
            for &term in terms {
                let found = harvest(&self.source, term, self.page_delay).await;
                info!(
                    modality,
                    term,
                    pages = found.pages,
                    studies = found.items.len(),
                    "Fetched studies"
                );

                records.extend(found.items.into_iter().map(|study| StudyRecord {
                    modality,
                    term: term.to_string(),
                    study,
                }));
                if let Some(error) = found.error {
                    report.record_fetch_error(error);
                }
            }
        }

        Ok(SourceBatch::Records(records))
    }

    fn raw_label(&self, raw: &StudyRecord) -> String {
        format!(
            "{} (modality {}, term '{}')",
            raw.nct_id().unwrap_or("<no nct_id>"),
            raw.modality,
            raw.term
        )
    }

    fn normalize(&self, raw: &StudyRecord) -> std::result::Result<TrialRow, Rejection> {
        TrialRow::try_from(raw)
    }

    fn entity_key(&self, row: &TrialRow) -> EntityKey {
        EntityKey::identifier(row.nct_id.clone())
    }

    fn category(&self, row: &TrialRow) -> String {
        row.modality.clone()
    }

    fn preview(&self, row: &TrialRow) -> String {
        let title: String = row.title.chars().take(50).collect();
        format!(
            "{} | {:12} | {:30} | {}",
            row.nct_id,
            row.modality,
            row.status.as_deref().unwrap_or("-"),
            title
        )
    }
}

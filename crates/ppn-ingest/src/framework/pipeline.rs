//! Pipeline driver
//!
//! Every job runs the same fixed sequence, with no branching back:
//!
//! 1. Load the known-name snapshot (only for jobs that declare name sources)
//! 2. Fetch raw records
//! 3. Normalize, tallying rejections
//! 4. Deduplicate by entity key (first occurrence wins), then filter
//!    against the known names
//! 5. Write (or preview) in batches
//! 6. Report
//!
//! Only a setup failure in phase 1 or 2 aborts a run. Everything later is
//! recovered at its own granularity and shows up in the [`RunReport`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::dedup::{Deduplicator, EntityKey};
use super::filter::{KnownNameSet, NameSource};
use super::report::{RunMode, RunReport};
use super::writer::{BatchWriter, NameLookupError, WriteTarget, DEFAULT_BATCH_DELAY};
use crate::error::{IngestError, Rejection, Result};

/// What a job's fetch step produced
#[derive(Debug)]
pub enum SourceBatch<R> {
    Records(Vec<R>),
    /// The source does not exist yet; a successful run with nothing to do
    Unavailable { reason: String },
}

/// One reference-data ingestion job
///
/// A job supplies the source and the normalization rules; the [`Pipeline`]
/// supplies everything else.
#[async_trait]
pub trait IngestJob: Send + Sync {
    /// Record as delivered by the source
    type Raw: Send + Sync;
    /// Validated row matching the target table's columns
    type Row: Serialize + Send + Sync;

    fn name(&self) -> &'static str;

    fn table(&self) -> &'static str;

    /// Unique-key columns for conflict-ignoring inserts
    fn conflict_key(&self) -> Option<&'static str>;

    fn batch_size(&self) -> usize;

    /// Tables whose names make up the known-name snapshot; empty means unfiltered
    fn name_sources(&self) -> &[NameSource] {
        &[]
    }

    /// Fetch every raw record
    ///
    /// Page-level failures are recorded on `report` and do not fail the call.
    async fn fetch(&self, report: &mut RunReport) -> Result<SourceBatch<Self::Raw>>;

    /// Short description of a raw record for skip log lines
    fn raw_label(&self, raw: &Self::Raw) -> String;

    fn normalize(&self, raw: &Self::Raw) -> std::result::Result<Self::Row, Rejection>;

    fn entity_key(&self, row: &Self::Row) -> EntityKey;

    /// Names checked against the known-name snapshot
    fn names<'r>(&self, _row: &'r Self::Row) -> Vec<&'r str> {
        Vec::new()
    }

    /// Category for the report breakdown
    fn category(&self, row: &Self::Row) -> String;

    /// One-line rendering of a row for dry-run previews
    fn preview(&self, row: &Self::Row) -> String;
}

/// Runs jobs against a write target
pub struct Pipeline<'t, T: WriteTarget + ?Sized> {
    target: &'t T,
    mode: RunMode,
    batch_delay: Duration,
}

impl<'t, T: WriteTarget + ?Sized> Pipeline<'t, T> {
    pub fn new(target: &'t T, mode: RunMode) -> Self {
        Self {
            target,
            mode,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Run one job to completion and return its report
    #[instrument(skip_all, fields(job = job.name(), mode = %self.mode))]
    pub async fn run<J: IngestJob>(&self, job: &J) -> RunReport {
        let mut report = RunReport::new(job.name(), self.mode);
        info!(table = job.table(), "Starting ingestion");

        // Phase 1: Known names
        let known = if job.name_sources().is_empty() {
            KnownNameSet::unfiltered()
        } else {
            info!("Phase 1: Loading known names");
            match self.load_known_names(job).await {
                Ok(known) => known,
                Err(e) => {
                    error!(error = %e, "Setup failed");
                    report.abort(e.to_string());
                    report.log();
                    return report;
                },
            }
        };
        report.known_names = known.len();

        // Phase 2: Fetch
        info!("Phase 2: Fetching source records");
        let raws = match job.fetch(&mut report).await {
            Ok(SourceBatch::Records(raws)) => raws,
            Ok(SourceBatch::Unavailable { reason }) => {
                info!(reason = %reason, "Source unavailable; nothing to do");
                report.nothing_to_do(reason);
                report.log();
                return report;
            },
            Err(e) => {
                error!(error = %e, "Fetch setup failed");
                report.abort(e.to_string());
                report.log();
                return report;
            },
        };
        report.fetched = raws.len();
        info!(
            fetched = report.fetched,
            fetch_errors = report.fetch_errors.len(),
            "Fetch complete"
        );

        // Phase 3: Normalize
        info!("Phase 3: Normalizing records");
        let mut rows = Vec::with_capacity(raws.len());
        for raw in &raws {
            match job.normalize(raw) {
                Ok(row) => rows.push(row),
                Err(rejection) => {
                    warn!(
                        record = %job.raw_label(raw),
                        reason = %rejection,
                        "Skipping record"
                    );
                    report.record_rejection(&rejection);
                },
            }
        }
        report.valid = rows.len();

        // Phase 4: Deduplicate and filter
        info!("Phase 4: Deduplicating and filtering");
        let mut dedup = Deduplicator::new();
        rows.retain(|row| dedup.admit(job.entity_key(row)));
        report.deduplicated = dedup.dropped();

        let before = rows.len();
        rows.retain(|row| known.admits(&job.names(row)));
        report.filtered_out = before - rows.len();

        for row in &rows {
            *report.breakdown.entry(job.category(row)).or_insert(0) += 1;
        }
        report.queued = rows.len();
        info!(
            valid = report.valid,
            skipped = report.skipped_total(),
            deduplicated = report.deduplicated,
            filtered_out = report.filtered_out,
            known_names = report.known_names,
            queued = report.queued,
            "Rows ready to write"
        );

        // Phase 5: Write
        info!("Phase 5: Writing {} rows to {}", rows.len(), job.table());
        let outcome = BatchWriter::new(self.target, job.table(), job.batch_size())
            .with_conflict_key(job.conflict_key())
            .with_delay(self.batch_delay)
            .write(&rows, self.mode, |row| job.preview(row))
            .await;

        report.batches = outcome.batches;
        if self.mode.is_dry_run() {
            report.would_write = outcome.rows_accepted;
        } else {
            report.written = outcome.rows_accepted;
            report.batches_succeeded = outcome.batches_succeeded;
            report.failed_batches = outcome.failures;
        }

        // Phase 6: Report
        report.finish();
        report.log();
        report
    }

    async fn load_known_names<J: IngestJob>(&self, job: &J) -> Result<KnownNameSet> {
        let mut known = KnownNameSet::unfiltered();

        for source in job.name_sources() {
            match self.target.fetch_names(source).await {
                Ok(names) => {
                    info!(
                        table = source.table,
                        column = source.column,
                        count = names.len(),
                        "Loaded known names"
                    );
                    known.extend(names);
                },
                Err(NameLookupError::TableMissing) if source.optional => {
                    warn!(table = source.table, "Name table not found; treating it as empty");
                },
                Err(e) => {
                    return Err(IngestError::setup(
                        job.name(),
                        format!(
                            "known-names lookup on {}.{} failed: {}",
                            source.table, source.column, e
                        ),
                    ));
                },
            }
        }

        Ok(known)
    }
}

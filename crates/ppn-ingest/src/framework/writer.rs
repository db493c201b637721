//! Batched, conflict-ignoring writes to the reference tables
//!
//! The [`WriteTarget`] trait is the seam between the pipeline and the
//! database. [`BatchWriter`] slices rows into fixed-size batches, previews
//! them in a dry run, and in a live run submits them one by one. A rejected
//! batch is recorded and the next one is still attempted.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::filter::NameSource;
use super::report::RunMode;
use crate::error::BatchFailure;

/// Default pause between consecutive live batches
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(200);

/// Dry-run rows previewed at info level per run; the rest go to debug
pub const PREVIEW_ROWS: usize = 5;

/// The target refused a batch or never answered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("write rejected (status {status:?}): {body}")]
pub struct WriteRejection {
    /// `None` for transport errors and timeouts
    pub status: Option<u16>,
    pub body: String,
}

/// Why a known-names lookup failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameLookupError {
    /// The table does not exist (yet)
    #[error("table not found")]
    TableMissing,

    #[error("{0}")]
    Failed(String),
}

/// A database that accepts insert-or-skip batches and can list names
#[async_trait]
pub trait WriteTarget: Send + Sync {
    /// Insert `rows` (a JSON array) into `table`, leaving rows whose unique
    /// key already exists untouched
    async fn insert_ignoring_conflicts(
        &self,
        table: &str,
        on_conflict: Option<&str>,
        rows: &serde_json::Value,
    ) -> Result<(), WriteRejection>;

    /// Read every value of one name column
    async fn fetch_names(&self, source: &NameSource) -> Result<Vec<String>, NameLookupError>;
}

/// Result of pushing one job's rows through the writer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub batches: usize,
    pub batches_succeeded: usize,
    /// Rows in acknowledged batches (live) or previewed rows (dry run)
    pub rows_accepted: usize,
    pub failures: Vec<BatchFailure>,
}

/// Splits rows into batches and submits them sequentially
pub struct BatchWriter<'t, T: WriteTarget + ?Sized> {
    target: &'t T,
    table: &'static str,
    on_conflict: Option<&'static str>,
    batch_size: usize,
    delay: Duration,
}

impl<'t, T: WriteTarget + ?Sized> BatchWriter<'t, T> {
    pub fn new(target: &'t T, table: &'static str, batch_size: usize) -> Self {
        Self {
            target,
            table,
            on_conflict: None,
            batch_size: batch_size.max(1),
            delay: DEFAULT_BATCH_DELAY,
        }
    }

    pub fn with_conflict_key(mut self, on_conflict: Option<&'static str>) -> Self {
        self.on_conflict = on_conflict;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Write (or preview) `rows` in order
    ///
    /// `preview` renders one row as a human-readable line for dry runs.
    pub async fn write<R, F>(&self, rows: &[R], mode: RunMode, preview: F) -> WriteOutcome
    where
        R: Serialize + Sync,
        F: Fn(&R) -> String,
    {
        let total_batches = rows.len().div_ceil(self.batch_size);
        let mut outcome = WriteOutcome::default();

        for (idx, chunk) in rows.chunks(self.batch_size).enumerate() {
            let batch = idx + 1;
            outcome.batches += 1;

            if mode.is_dry_run() {
                info!(
                    table = self.table,
                    batch,
                    total_batches,
                    rows = chunk.len(),
                    "Dry run: would insert batch"
                );
                for (offset, row) in chunk.iter().enumerate() {
                    if idx * self.batch_size + offset < PREVIEW_ROWS {
                        info!("  {}", preview(row));
                    } else {
                        debug!("  {}", preview(row));
                    }
                }
                outcome.batches_succeeded += 1;
                outcome.rows_accepted += chunk.len();
                continue;
            }

            if batch > 1 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let result = match serde_json::to_value(chunk) {
                Ok(body) => {
                    self.target
                        .insert_ignoring_conflicts(self.table, self.on_conflict, &body)
                        .await
                },
                Err(e) => Err(WriteRejection {
                    status: None,
                    body: format!("failed to serialize batch: {}", e),
                }),
            };

            match result {
                Ok(()) => {
                    outcome.batches_succeeded += 1;
                    outcome.rows_accepted += chunk.len();
                    info!(
                        table = self.table,
                        batch,
                        total_batches,
                        rows = chunk.len(),
                        "Inserted batch"
                    );
                },
                Err(rejection) => {
                    warn!(
                        table = self.table,
                        batch,
                        total_batches,
                        rows = chunk.len(),
                        status = ?rejection.status,
                        body = %rejection.body,
                        "Batch rejected; continuing with next batch"
                    );
                    outcome.failures.push(BatchFailure {
                        batch,
                        rows: chunk.len(),
                        status: rejection.status,
                        body: rejection.body,
                    });
                },
            }
        }

        outcome
    }
}

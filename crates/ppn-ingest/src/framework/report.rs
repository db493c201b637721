//! Run report: the single observable outcome of a pipeline run

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{BatchFailure, FetchError, Rejection};

/// Whether writes are sent or only previewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    DryRun,
    Live,
}

impl RunMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            Self::DryRun
        } else {
            Self::Live
        }
    }

    pub fn is_dry_run(self) -> bool {
        self == Self::DryRun
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry-run"),
            Self::Live => write!(f, "live"),
        }
    }
}

/// Terminal status of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Still running; never left in a finished report
    Running,
    /// Source absent or empty; nothing was attempted
    NothingToDo { reason: String },
    /// Dry run finished; no writes were issued
    Preview,
    /// Live run with every batch acknowledged and every page fetched
    Passed,
    /// Live run that finished with failed batches or failed page fetches
    CompletedWithErrors,
    /// Setup failure before any write
    Aborted { reason: String },
}

/// Counts and outcomes of one job run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub job: String,
    pub mode: RunMode,
    pub status: RunStatus,
    /// Raw records produced by the fetcher
    pub fetched: usize,
    pub fetch_errors: Vec<FetchError>,
    /// Rows refused by the normalizer, by reason
    pub skipped: BTreeMap<String, usize>,
    /// Rows that passed normalization
    pub valid: usize,
    /// Rows dropped as in-run duplicates
    pub deduplicated: usize,
    /// Rows dropped by the reference filter
    pub filtered_out: usize,
    /// Size of the known-name snapshot (0 when the job is unfiltered)
    pub known_names: usize,
    /// Rows handed to the batch writer
    pub queued: usize,
    /// Rows a dry run would have sent
    pub would_write: usize,
    /// Rows in batches the target acknowledged
    pub written: usize,
    /// Batches attempted, or previewed in a dry run
    pub batches: usize,
    pub batches_succeeded: usize,
    pub failed_batches: Vec<BatchFailure>,
    /// Queued rows per category (modality, severity grade, ...)
    pub breakdown: BTreeMap<String, usize>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(job: impl Into<String>, mode: RunMode) -> Self {
        Self {
            job: job.into(),
            mode,
            status: RunStatus::Running,
            fetched: 0,
            fetch_errors: Vec::new(),
            skipped: BTreeMap::new(),
            valid: 0,
            deduplicated: 0,
            filtered_out: 0,
            known_names: 0,
            queued: 0,
            would_write: 0,
            written: 0,
            batches: 0,
            batches_succeeded: 0,
            failed_batches: Vec::new(),
            breakdown: BTreeMap::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn record_rejection(&mut self, rejection: &Rejection) {
        *self.skipped.entry(rejection.tally_key()).or_insert(0) += 1;
    }

    pub fn record_fetch_error(&mut self, error: FetchError) {
        self.fetch_errors.push(error);
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    /// End the run before any write because setup failed
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.status = RunStatus::Aborted {
            reason: reason.into(),
        };
        self.completed_at = Some(Utc::now());
    }

    /// End the run successfully without attempting anything
    pub fn nothing_to_do(&mut self, reason: impl Into<String>) {
        self.status = RunStatus::NothingToDo {
            reason: reason.into(),
        };
        self.completed_at = Some(Utc::now());
    }

    /// Settle the terminal status from the counts
    pub fn finish(&mut self) {
        if self.status == RunStatus::Running {
            self.status = if self.fetched == 0 && self.fetch_errors.is_empty() {
                RunStatus::NothingToDo {
                    reason: "source yielded no records".to_string(),
                }
            } else if self.mode.is_dry_run() {
                RunStatus::Preview
            } else if self.failed_batches.is_empty() && self.fetch_errors.is_empty() {
                RunStatus::Passed
            } else {
                RunStatus::CompletedWithErrors
            };
        }
        self.completed_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            RunStatus::Passed | RunStatus::Preview | RunStatus::NothingToDo { .. }
        )
    }

    /// Process exit status for this report
    pub fn exit_code(&self) -> u8 {
        match self.status {
            RunStatus::Passed | RunStatus::Preview | RunStatus::NothingToDo { .. } => 0,
            RunStatus::Running | RunStatus::Aborted { .. } => 1,
            RunStatus::CompletedWithErrors => 2,
        }
    }

    /// Get a one-line summary of the run
    pub fn summary(&self) -> String {
        match &self.status {
            RunStatus::Running => format!("{}: still running", self.job),
            RunStatus::NothingToDo { reason } => {
                format!("{}: Nothing to do ({})", self.job, reason)
            },
            RunStatus::Aborted { reason } => format!("{}: Aborted: {}", self.job, reason),
            RunStatus::Preview => format!(
                "{}: Dry run: would write {} rows in {} batches ({} fetched, {} skipped, {} duplicates, {} filtered out)",
                self.job,
                self.would_write,
                self.batches,
                self.fetched,
                self.skipped_total(),
                self.deduplicated,
                self.filtered_out
            ),
            RunStatus::Passed => format!(
                "{}: Wrote {} of {} rows in {} batches ({} fetched, {} skipped, {} duplicates, {} filtered out)",
                self.job,
                self.written,
                self.queued,
                self.batches_succeeded,
                self.fetched,
                self.skipped_total(),
                self.deduplicated,
                self.filtered_out
            ),
            RunStatus::CompletedWithErrors => format!(
                "{}: Wrote {} of {} rows, {} batches failed, {} page fetches failed ({} fetched, {} skipped)",
                self.job,
                self.written,
                self.queued,
                self.failed_batches.len(),
                self.fetch_errors.len(),
                self.fetched,
                self.skipped_total()
            ),
        }
    }

    /// Emit the final summary, including skip reasons and breakdown
    pub fn log(&self) {
        info!(
            job = %self.job,
            mode = %self.mode,
            fetched = self.fetched,
            valid = self.valid,
            skipped = self.skipped_total(),
            deduplicated = self.deduplicated,
            filtered_out = self.filtered_out,
            queued = self.queued,
            written = self.written,
            failed_batches = self.failed_batches.len(),
            "Run summary"
        );

        for (reason, count) in &self.skipped {
            info!(job = %self.job, reason = %reason, count, "Skipped rows");
        }
        for (category, count) in &self.breakdown {
            info!(job = %self.job, category = %category, count, "Breakdown");
        }
        for failure in &self.failed_batches {
            warn!(
                job = %self.job,
                batch = failure.batch,
                rows = failure.rows,
                status = ?failure.status,
                body = %failure.body,
                "Batch failed"
            );
        }
        for error in &self.fetch_errors {
            warn!(job = %self.job, error = %error, "Page fetch failed");
        }

        if self.is_success() {
            info!("{}", self.summary());
        } else {
            warn!("{}", self.summary());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::FetchFailure;

    fn failure(batch: usize) -> BatchFailure {
        BatchFailure {
            batch,
            rows: 50,
            status: Some(409),
            body: "conflict".to_string(),
        }
    }

    #[test]
    fn test_empty_source_is_nothing_to_do() {
        let mut report = RunReport::new("trials", RunMode::Live);
        report.finish();
        assert!(matches!(report.status, RunStatus::NothingToDo { .. }));
        assert_eq!(report.exit_code(), 0);
        assert!(report.summary().contains("Nothing to do"));
    }

    #[test]
    fn test_statuses_are_distinguishable() {
        let mut skipped = RunReport::new("cohorts", RunMode::Live);
        skipped.fetched = 10;
        skipped.record_rejection(&Rejection::MissingRequiredField("source_citation"));
        skipped.queued = 9;
        skipped.written = 9;
        skipped.batches_succeeded = 1;
        skipped.finish();
        assert_eq!(skipped.status, RunStatus::Passed);
        assert_eq!(skipped.skipped_total(), 1);
        assert_eq!(skipped.exit_code(), 0);

        let mut partial = RunReport::new("cohorts", RunMode::Live);
        partial.fetched = 130;
        partial.queued = 130;
        partial.written = 80;
        partial.batches_succeeded = 2;
        partial.failed_batches.push(failure(2));
        partial.finish();
        assert_eq!(partial.status, RunStatus::CompletedWithErrors);
        assert_eq!(partial.exit_code(), 2);
        assert!(partial.summary().contains("Wrote 80 of 130 rows, 1 batches failed"));
    }

    #[test]
    fn test_dry_run_previews_even_with_errors() {
        let mut report = RunReport::new("trials", RunMode::DryRun);
        report.fetched = 3;
        report.fetch_errors.push(FetchError {
            term: "lsd".to_string(),
            page: 2,
            cause: FetchFailure::Transport("timed out".to_string()),
        });
        report.finish();
        assert_eq!(report.status, RunStatus::Preview);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_fetch_errors_fail_a_live_run() {
        let mut report = RunReport::new("trials", RunMode::Live);
        report.record_fetch_error(FetchError {
            term: "dmt".to_string(),
            page: 1,
            cause: FetchFailure::Status {
                status: 500,
                body: String::new(),
            },
        });
        report.finish();
        assert_eq!(report.status, RunStatus::CompletedWithErrors);
    }

    #[test]
    fn test_abort_is_not_overwritten_by_finish() {
        let mut report = RunReport::new("interactions", RunMode::Live);
        report.abort("known-names lookup failed");
        report.finish();
        assert!(matches!(report.status, RunStatus::Aborted { .. }));
        assert_eq!(report.exit_code(), 1);
        assert!(report.completed_at.is_some());
    }

    #[test]
    fn test_rejections_tally_by_reason() {
        let mut report = RunReport::new("cohorts", RunMode::DryRun);
        report.record_rejection(&Rejection::invalid("n_participants", "abc"));
        report.record_rejection(&Rejection::invalid("n_participants", "-1"));
        report.record_rejection(&Rejection::MissingRequiredField("instrument"));
        assert_eq!(report.skipped.get("invalid_type(n_participants)"), Some(&2));
        assert_eq!(report.skipped.get("missing_required_field(instrument)"), Some(&1));
    }

    #[test]
    fn test_report_serializes_status_tag() {
        let mut report = RunReport::new("trials", RunMode::DryRun);
        report.nothing_to_do("no file");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"]["status"], "nothing_to_do");
        assert_eq!(value["mode"], "dry_run");
    }
}

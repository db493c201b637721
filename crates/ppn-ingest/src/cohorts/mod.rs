//! Curated cohort-statistics job
//!
//! Reads aggregate outcomes extracted from open-access publications out of a
//! curator-maintained CSV and seeds `benchmark_cohorts`. The CSV may not
//! exist yet; that is a successful run with nothing to do.
//!
//! The table has no declared natural key, so inserts rely on its own
//! constraints to skip existing rows; in-run duplicates are dropped by
//! citation, cohort name and instrument.

pub mod job;
pub mod models;
pub mod reader;

pub use job::CohortsJob;
pub use models::{CohortRow, RawCohort};
pub use reader::{read_cohorts, CohortLine};

pub const TABLE: &str = "benchmark_cohorts";
pub const BATCH_SIZE: usize = 50;

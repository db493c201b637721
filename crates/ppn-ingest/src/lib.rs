//! PPN Reference Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Seeds the portal's reference tables from public sources.
//!
//! # Supported Jobs
//!
//! - **trials**: ClinicalTrials.gov studies for psychedelic modalities → `benchmark_trials`
//! - **cohorts**: curated aggregate outcomes CSV → `benchmark_cohorts`
//! - **interactions**: TripSit drug combinations → `ref_clinical_interactions`
//!
//! Every job runs through the same [`Pipeline`](framework::Pipeline): fetch,
//! normalize, deduplicate, filter against known names, write in batches with
//! insert-or-skip semantics, report. Re-running a job against an unchanged
//! source adds nothing.
//!
//! # Example
//!
//! ```no_run
//! use ppn_ingest::config::IngestConfig;
//! use ppn_ingest::framework::{Pipeline, RunMode};
//! use ppn_ingest::target::RestTarget;
//! use ppn_ingest::trials::TrialsJob;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let client = config.http_client()?;
//!     let target = RestTarget::from_config(&config, client.clone());
//!
//!     let report = Pipeline::new(&target, RunMode::DryRun)
//!         .run(&TrialsJob::from_config(&config, client))
//!         .await;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

pub mod cohorts;
pub mod config;
pub mod error;
pub mod framework;
pub mod interactions;
pub mod target;
pub mod trials;

pub use config::IngestConfig;
pub use error::{IngestError, Result};

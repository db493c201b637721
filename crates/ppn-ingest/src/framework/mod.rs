//! Job-independent pipeline parts
//!
//! Each ingestion job plugs into the [`Pipeline`] by implementing
//! [`IngestJob`]; fetching, normalization and key extraction are per job,
//! everything else lives here.

pub mod coerce;
pub mod dedup;
pub mod filter;
pub mod pager;
pub mod pipeline;
pub mod report;
pub mod writer;

pub use dedup::{Deduplicator, EntityKey};
pub use filter::{KnownNameSet, NameSource};
pub use pager::{harvest, Harvest, Page, PageSource, Paginator, DEFAULT_PAGE_DELAY};
pub use pipeline::{IngestJob, Pipeline, SourceBatch};
pub use report::{RunMode, RunReport, RunStatus};
pub use writer::{
    BatchWriter, NameLookupError, WriteOutcome, WriteRejection, WriteTarget, DEFAULT_BATCH_DELAY,
};

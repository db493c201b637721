//! Community drug-interaction job
//!
//! Seeds `ref_clinical_interactions` from the TripSit combinations chart.
//! Only pairs where at least one side is a substance or medication the portal
//! already knows are kept. Every row is labelled as unverified community data.

pub mod fetcher;
pub mod job;
pub mod models;

pub use fetcher::TripSitSource;
pub use job::InteractionsJob;
pub use models::{severity_for, title_case, ComboRecord, InteractionRow, SeverityGrade};

use crate::framework::NameSource;

// ============================================================================
// Interactions Constants
// ============================================================================

pub const TABLE: &str = "ref_clinical_interactions";
pub const CONFLICT_KEY: &str = "substance_name,interactor_name";
pub const BATCH_SIZE: usize = 100;

pub const INTERACTOR_CATEGORY: &str = "Community/Harm-Reduction";
pub const EVIDENCE_SOURCE: &str = "TripSit Drug Combinations Chart (community/anecdotal)";
pub const SOURCE_URL: &str = "https://wiki.tripsit.me/wiki/Drug_combinations";
pub const DEFAULT_NOTE: &str = "No interaction note provided by TripSit.";

/// Known-name sources; the medications table may not exist yet
pub const NAME_SOURCES: [NameSource; 2] = [
    NameSource::required("ref_substances", "substance_name"),
    NameSource::optional("ref_medications", "medication_name"),
];

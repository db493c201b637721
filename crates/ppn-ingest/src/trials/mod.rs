//! Trial-registry job
//!
//! Searches ClinicalTrials.gov for each psychedelic modality and seeds
//! `benchmark_trials` with the completed and active studies it finds. A trial
//! that matches several search terms is kept once, under the modality of the
//! first search that found it.

pub mod fetcher;
pub mod job;
pub mod models;

pub use fetcher::CtGovSource;
pub use job::TrialsJob;
pub use models::{StudyRecord, TrialRow};

// ============================================================================
// Trials Constants
// ============================================================================

pub const TABLE: &str = "benchmark_trials";
pub const CONFLICT_KEY: &str = "nct_id";
pub const BATCH_SIZE: usize = 50;

/// Results per registry page
pub const PAGE_SIZE: usize = 100;

pub const TITLE_MAX_CHARS: usize = 500;

pub const SOURCE_LABEL: &str = "clinicaltrials.gov";

pub const STATUS_FILTER: &str = "COMPLETED,ACTIVE_NOT_RECRUITING,RECRUITING";

/// Field projection requested from the registry
pub const STUDY_FIELDS: &[&str] = &[
    "protocolSection.identificationModule.nctId",
    "protocolSection.identificationModule.briefTitle",
    "protocolSection.designModule.phases",
    "protocolSection.statusModule.overallStatus",
    "protocolSection.conditionsModule.conditions",
    "protocolSection.designModule.enrollmentInfo",
    "protocolSection.statusModule.startDateStruct",
    "protocolSection.statusModule.completionDateStruct",
    "protocolSection.outcomesModule.primaryOutcomes",
    "protocolSection.contactsLocationsModule.locations",
];

/// Modality label stored with each row, and the intervention terms searched for it
pub const MODALITY_SEARCHES: &[(&str, &[&str])] = &[
    ("psilocybin", &["psilocybin"]),
    ("mdma", &["MDMA", "3,4-methylenedioxymethamphetamine"]),
    ("ketamine", &["ketamine"]),
    ("esketamine", &["esketamine", "Spravato"]),
    ("lsd", &["lysergic acid diethylamide", "LSD-25"]),
    ("ayahuasca", &["ayahuasca"]),
    ("dmt", &["dimethyltryptamine", "DMT"]),
    ("ibogaine", &["ibogaine"]),
    ("mescaline", &["mescaline"]),
];

//! Ingestion configuration
//!
//! Built once at start-up and passed by reference into every job. Nothing in
//! this crate reads the environment after [`IngestConfig::from_env`] returns.

use std::path::PathBuf;
use std::time::Duration;

use ppn_common::env::{EnvSource, ProcessEnv};
use ppn_common::{ConfigError, Result};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default per-call timeout for every fetch and write request.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// ClinicalTrials.gov API v2 study search endpoint.
pub const DEFAULT_TRIALS_API_URL: &str = "https://clinicaltrials.gov/api/v2/studies";

/// TripSit drug-combination chart, raw JSON.
pub const DEFAULT_TRIPSIT_COMBOS_URL: &str =
    "https://raw.githubusercontent.com/TripSit/drugs/master/combos.json";

/// Where the curated cohort statistics CSV is expected to appear.
pub const DEFAULT_COHORTS_CSV: &str = "backend/data/benchmark_cohorts_seed.csv";

/// User agent sent to every upstream.
pub const USER_AGENT: &str = concat!("PPN-Reference-Ingest/", env!("CARGO_PKG_VERSION"));

const SUPABASE_HINT: &str =
    "These are in backend/.env; run `source backend/.env` or export them manually.";

/// Credentials and endpoint of the managed database's REST interface
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL without trailing slash, e.g. `https://abc.supabase.co`
    pub url: String,
    /// Service-role key; bypasses row-level security
    pub service_role_key: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_role_key", &"<redacted>")
            .finish()
    }
}

/// Main ingestion configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub supabase: SupabaseConfig,
    /// Per-call timeout in seconds
    pub http_timeout_secs: u64,
    pub trials_api_url: String,
    pub tripsit_combos_url: String,
    /// Default location of the curated cohorts CSV
    pub cohorts_csv: PathBuf,
}

impl IngestConfig {
    /// Load configuration from the process environment
    ///
    /// `.env` is not read here; the binary loads it once at start-up.
    pub fn from_env() -> Result<Self> {
        Self::from_source(&ProcessEnv)
    }

    /// Load configuration from an arbitrary lookup
    ///
    /// Environment variables:
    /// - `SUPABASE_URL` (required)
    /// - `SUPABASE_SERVICE_ROLE_KEY` (required)
    /// - `PPN_HTTP_TIMEOUT_SECS` (default 30)
    /// - `PPN_TRIALS_API_URL`
    /// - `PPN_TRIPSIT_COMBOS_URL`
    /// - `PPN_COHORTS_CSV`
    pub fn from_source(env: &impl EnvSource) -> Result<Self> {
        let config = Self {
            supabase: SupabaseConfig {
                url: env
                    .required("SUPABASE_URL", SUPABASE_HINT)?
                    .trim_end_matches('/')
                    .to_string(),
                service_role_key: env.required("SUPABASE_SERVICE_ROLE_KEY", SUPABASE_HINT)?,
            },
            http_timeout_secs: env.parse_or("PPN_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            trials_api_url: env
                .optional("PPN_TRIALS_API_URL")
                .unwrap_or_else(|| DEFAULT_TRIALS_API_URL.to_string()),
            tripsit_combos_url: env
                .optional("PPN_TRIPSIT_COMBOS_URL")
                .unwrap_or_else(|| DEFAULT_TRIPSIT_COMBOS_URL.to_string()),
            cohorts_csv: env
                .optional("PPN_COHORTS_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COHORTS_CSV)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        require_http_url("SUPABASE_URL", &self.supabase.url)?;
        require_http_url("PPN_TRIALS_API_URL", &self.trials_api_url)?;
        require_http_url("PPN_TRIPSIT_COMBOS_URL", &self.tripsit_combos_url)?;

        if self.http_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "PPN_HTTP_TIMEOUT_SECS",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Get the per-call timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// HTTP client shared by fetchers and the write target
    pub fn http_client(&self) -> std::result::Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.http_timeout())
            .user_agent(USER_AGENT)
            .build()
    }
}

fn require_http_url(var: &str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            var,
            format!("'{}' is not an http(s) URL", value),
        ))
    }
}

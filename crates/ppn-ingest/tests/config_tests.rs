//! Configuration loading from the real process environment
//!
//! These tests mutate process-wide variables and therefore run serially.

use std::path::PathBuf;

use ppn_common::ConfigError;
use ppn_ingest::config::{DEFAULT_COHORTS_CSV, DEFAULT_TRIALS_API_URL};
use ppn_ingest::IngestConfig;
use serial_test::serial;

const VARS: &[&str] = &[
    "SUPABASE_URL",
    "SUPABASE_SERVICE_ROLE_KEY",
    "PPN_HTTP_TIMEOUT_SECS",
    "PPN_TRIALS_API_URL",
    "PPN_TRIPSIT_COMBOS_URL",
    "PPN_COHORTS_CSV",
];

/// Runs `f` with exactly `pairs` set among [`VARS`], restoring the previous values afterwards
fn with_env<R>(pairs: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let saved: Vec<(&str, Option<String>)> =
        VARS.iter().map(|v| (*v, std::env::var(v).ok())).collect();

    for var in VARS {
        std::env::remove_var(var);
    }
    for (key, value) in pairs {
        std::env::set_var(key, value);
    }

    let result = f();

    for (var, value) in saved {
        match value {
            Some(value) => std::env::set_var(var, value),
            None => std::env::remove_var(var),
        }
    }
    result
}

#[test]
#[serial]
fn test_from_env_reads_process_variables() {
    let config = with_env(
        &[
            ("SUPABASE_URL", "https://project.supabase.co/"),
            ("SUPABASE_SERVICE_ROLE_KEY", "secret"),
            ("PPN_HTTP_TIMEOUT_SECS", "5"),
            ("PPN_COHORTS_CSV", "/data/cohorts.csv"),
        ],
        IngestConfig::from_env,
    )
    .unwrap();

    assert_eq!(config.supabase.url, "https://project.supabase.co");
    assert_eq!(config.supabase.service_role_key, "secret");
    assert_eq!(config.http_timeout_secs, 5);
    assert_eq!(config.trials_api_url, DEFAULT_TRIALS_API_URL);
    assert_eq!(config.cohorts_csv, PathBuf::from("/data/cohorts.csv"));
    assert_ne!(config.cohorts_csv, PathBuf::from(DEFAULT_COHORTS_CSV));
}

#[test]
#[serial]
fn test_from_env_without_credentials_fails() {
    let err = with_env(&[], IngestConfig::from_env).unwrap_err();

    assert!(matches!(err, ConfigError::MissingVar { ref var, .. } if var == "SUPABASE_URL"));
}

#[test]
#[serial]
fn test_blank_key_counts_as_missing() {
    let err = with_env(
        &[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "   "),
        ],
        IngestConfig::from_env,
    )
    .unwrap_err();

    assert!(
        matches!(err, ConfigError::MissingVar { ref var, .. } if var == "SUPABASE_SERVICE_ROLE_KEY")
    );
}

#[test]
#[serial]
fn test_debug_output_redacts_key() {
    let config = with_env(
        &[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "do-not-print"),
        ],
        IngestConfig::from_env,
    )
    .unwrap();

    let printed = format!("{:?}", config);
    assert!(!printed.contains("do-not-print"));
    assert!(printed.contains("<redacted>"));
}

#[test]
#[serial]
fn test_from_env_does_not_read_dotenv_itself() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "SUPABASE_URL=https://dotenv.supabase.co\nSUPABASE_SERVICE_ROLE_KEY=from-file\n",
    )
    .unwrap();
    let previous = std::env::current_dir().unwrap();

    std::env::set_current_dir(dir.path()).unwrap();
    let result = with_env(&[], IngestConfig::from_env);
    std::env::set_current_dir(previous).unwrap();

    assert!(matches!(result, Err(ConfigError::MissingVar { .. })));
}

//! Cohorts job tests over temporary CSV files

mod common;

use std::io::Write;

use common::{quiet_pipeline, MemoryTarget};
use ppn_common::ConfigError;
use ppn_ingest::cohorts::{CohortsJob, TABLE};
use ppn_ingest::framework::{RunMode, RunStatus};
use tempfile::{NamedTempFile, TempDir};

const HEADER: &str = "cohort_name,source_citation,modality,condition,setting,n_participants,country,instrument,baseline_mean,baseline_sd,endpoint_mean,endpoint_sd,followup_weeks,response_rate_pct,remission_rate_pct,effect_size_hedges_g,adverse_event_rate_pct,data_freely_usable,license,notes";

fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "{}", HEADER).expect("write header");
    for line in lines {
        writeln!(file, "{}", line).expect("write line");
    }
    file
}

fn curated() -> NamedTempFile {
    csv_file(&[
        "COMP360 25mg,\"Goodwin et al., 2022\",Psilocybin,TRD,clinical,79,UK,MADRS,31.9,5.4,19.6,,12,37,29,0.58,,yes,CC-BY,",
        "MAPP1 MDMA arm,Mitchell et al. 2021,MDMA,PTSD,clinical,46,US,CAPS-5,44.1,6.0,19.7,,18,,,0.91,,no,,",
        ",,ketamine,TRD,,20,,MADRS,,,,,,,,,,,,missing citation",
        "Bad count,Someone 2020,ketamine,TRD,,twenty,,MADRS,,,,,,,,,,,,",
        "comp360 25MG,\"goodwin et al., 2022\",psilocybin,TRD,,79,,madrs,,,,,12,,,,,,,duplicate",
    ])
}

#[tokio::test]
async fn test_curated_csv_is_normalized_and_written() {
    let file = curated();
    let target = MemoryTarget::new();

    let report = quiet_pipeline(&target, RunMode::Live)
        .run(&CohortsJob::new(file.path()))
        .await;

    assert_eq!(report.fetched, 5);
    assert_eq!(report.valid, 3);
    assert_eq!(
        report.skipped.get("missing_required_field(source_citation)"),
        Some(&1)
    );
    assert_eq!(report.skipped.get("invalid_type(n_participants)"), Some(&1));
    assert_eq!(report.deduplicated, 1);
    assert_eq!(report.written, 2);
    assert_eq!(report.status, RunStatus::Passed);
    assert_eq!(report.breakdown.get("psilocybin"), Some(&1));
    assert_eq!(report.breakdown.get("mdma"), Some(&1));

    let rows = target.rows(TABLE);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["source_citation"], "Goodwin et al., 2022");
    assert_eq!(rows[0]["modality"], "psilocybin");
    assert_eq!(rows[0]["n_participants"], 79);
    assert_eq!(rows[0]["baseline_mean"], 31.9);
    assert!(rows[0]["endpoint_sd"].is_null());
    assert_eq!(rows[0]["data_freely_usable"], true);
    assert_eq!(rows[1]["data_freely_usable"], false);
    assert!(target.calls().iter().all(|c| c.on_conflict.is_none()));
}

#[tokio::test]
async fn test_timepoints_and_conditions_of_one_arm_are_distinct_rows() {
    let file = csv_file(&[
        "COMP360 25mg,Goodwin 2022,psilocybin,TRD,,79,,MADRS,31.9,,20.1,,3,,,,,,,",
        "COMP360 25mg,Goodwin 2022,psilocybin,TRD,,79,,MADRS,31.9,,22.4,,12,,,,,,,",
        "Arm A,Smith 2021,psilocybin,TRD,,40,,MADRS,,,,,,,,,,,,",
        "Arm A,Smith 2021,psilocybin,AUD,,40,,MADRS,,,,,,,,,,,,",
    ]);
    let target = MemoryTarget::new();

    let report = quiet_pipeline(&target, RunMode::Live)
        .run(&CohortsJob::new(file.path()))
        .await;

    assert_eq!(report.valid, 4);
    assert_eq!(report.deduplicated, 0);
    assert_eq!(report.written, 4);

    let rows = target.rows(TABLE);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["followup_weeks"], 3);
    assert_eq!(rows[1]["followup_weeks"], 12);
    assert_eq!(rows[1]["endpoint_mean"], 22.4);
    assert_eq!(rows[3]["condition"], "AUD");
}

#[tokio::test]
async fn test_dry_run_reads_but_does_not_write() {
    let file = curated();
    let target = MemoryTarget::new();

    let report = quiet_pipeline(&target, RunMode::DryRun)
        .run(&CohortsJob::new(file.path()))
        .await;

    assert_eq!(report.status, RunStatus::Preview);
    assert_eq!(report.would_write, 2);
    assert!(target.calls().is_empty());
}

#[tokio::test]
async fn test_missing_default_csv_is_nothing_to_do() {
    let dir = TempDir::new().expect("temp dir");
    let target = MemoryTarget::new();

    let report = quiet_pipeline(&target, RunMode::Live)
        .run(&CohortsJob::new(dir.path().join("benchmark_cohorts_seed.csv")))
        .await;

    assert!(matches!(report.status, RunStatus::NothingToDo { .. }));
    assert_eq!(report.exit_code(), 0);
    assert!(report.summary().contains("Nothing to do"));
    assert!(target.calls().is_empty());
}

#[test]
fn test_explicit_path_must_exist() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("nope.csv");

    let err = CohortsJob::from_explicit_path(&missing).expect_err("missing file");
    assert_eq!(err, ConfigError::MissingInput(missing.display().to_string()));

    let file = curated();
    let job = CohortsJob::from_explicit_path(file.path()).expect("existing file");
    assert_eq!(job.path(), file.path());
}

#[tokio::test]
async fn test_header_only_csv_is_nothing_to_do() {
    let file = csv_file(&[]);
    let target = MemoryTarget::new();

    let report = quiet_pipeline(&target, RunMode::Live)
        .run(&CohortsJob::new(file.path()))
        .await;

    assert!(matches!(report.status, RunStatus::NothingToDo { .. }));
}

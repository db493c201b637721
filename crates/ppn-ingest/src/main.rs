//! PPN Ingest - reference-data seeding tool

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ppn_common::env::ProcessEnv;
use ppn_common::logging::{init_logging, LogConfig, LogLevel, LoggingGuard};
use ppn_ingest::cohorts::CohortsJob;
use ppn_ingest::framework::{IngestJob, Pipeline, RunMode, RunReport};
use ppn_ingest::interactions::InteractionsJob;
use ppn_ingest::target::RestTarget;
use ppn_ingest::trials::TrialsJob;
use ppn_ingest::IngestConfig;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ppn-ingest")]
#[command(author, version, about = "Seed PPN reference tables from public sources")]
struct Cli {
    /// Job to run
    #[command(subcommand)]
    job: Job,

    /// Preview rows without writing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Job {
    /// Seed benchmark_trials from ClinicalTrials.gov
    Trials,

    /// Seed benchmark_cohorts from the curated CSV
    Cohorts {
        /// CSV to read instead of the default curated location (must exist)
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Seed ref_clinical_interactions from the TripSit combinations chart
    Interactions,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    // Before logging, so LOG_* from .env apply too
    dotenvy::dotenv().ok();

    let _guard = match setup_logging(cli.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        },
    };

    match execute(&cli).await {
        Ok(report) => ExitCode::from(report.exit_code()),
        Err(e) => {
            error!(error = %e, "Ingestion failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

fn setup_logging(verbose: bool) -> Result<LoggingGuard> {
    let level = if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over flags
    let config = LogConfig::builder()
        .level(level)
        .log_file_prefix("ppn-ingest")
        .filter_directives("hyper=warn,reqwest=warn")
        .build()
        .merge_env(&ProcessEnv)?;

    init_logging(&config)
}

/// Load configuration, build the requested job and run it
///
/// Errors returned here are configuration or setup failures; everything
/// that happens during a run ends up in the report.
async fn execute(cli: &Cli) -> Result<RunReport> {
    let config = IngestConfig::from_env()?;
    let mode = RunMode::from_dry_run(cli.dry_run);
    let client = config.http_client()?;
    let target = RestTarget::from_config(&config, client.clone());

    info!(mode = %mode, supabase = %config.supabase.url, "Configuration loaded");

    let report = match &cli.job {
        Job::Trials => run(&target, mode, &TrialsJob::from_config(&config, client)).await,
        Job::Cohorts { csv } => {
            let job = match csv {
                Some(path) => CohortsJob::from_explicit_path(path)?,
                None => CohortsJob::new(&config.cohorts_csv),
            };
            run(&target, mode, &job).await
        },
        Job::Interactions => {
            run(&target, mode, &InteractionsJob::from_config(&config, client)).await
        },
    };

    Ok(report)
}

async fn run<J: IngestJob>(target: &RestTarget, mode: RunMode, job: &J) -> RunReport {
    Pipeline::new(target, mode).run(job).await
}

//! OCI compute metrics exporter
//!
//! Reads instance OCIDs from a file, fetches metadata and CPU/memory
//! utilization for each, derives the monitoring agent status, and writes
//! the results as JSON and as a spreadsheet.

mod export;
mod output;
mod spinner;

use clap::Parser;
use metrics_lib::client::DEFAULT_TIMEOUT;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Fetch OCI compute metrics for a list of instances
#[derive(Parser, Debug)]
#[command(name = "oci-metrics")]
#[command(author, version, about = "Fetch OCI compute metrics for a list of instances", long_about = None)]
pub struct Cli {
    /// OCI config profile name
    #[arg(short = 'c', long, default_value = "DEFAULT")]
    pub config_profile: String,

    /// OCI config file (defaults to ~/.oci/config)
    #[arg(long, env = "OCI_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// File with instance OCIDs, one per line
    #[arg(short, long, default_value = "all_instances.txt")]
    pub input: PathBuf,

    /// Output JSON file
    #[arg(short = 'o', long, default_value = "oci_metrics_output.json")]
    pub output_json: PathBuf,

    /// Output Excel file
    #[arg(short = 'x', long, default_value = "oci_metrics_output.xlsx")]
    pub output_xlsx: PathBuf,

    /// Compute service endpoint (derived from the profile region if not set)
    #[arg(long, env = "OCI_COMPUTE_ENDPOINT")]
    pub compute_endpoint: Option<String>,

    /// Monitoring service endpoint (derived from the profile region if not set)
    #[arg(long, env = "OCI_MONITORING_ENDPOINT")]
    pub monitoring_endpoint: Option<String>,

    /// Metric lookback window in seconds
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u32).range(1..))]
    pub window_secs: u32,

    /// Request timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Skip the summary table
    #[arg(long)]
    pub no_summary: bool,
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let spinner = spinner::Spinner::start("Fetching metrics from oci");
    let result = export::run(&cli).await;
    spinner.stop().await;

    match result {
        Ok(report) => {
            if !cli.no_summary {
                output::print_summary(&report);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

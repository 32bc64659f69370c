//! The export pipeline: credentials, input list, per-instance processing, outputs

use anyhow::{anyhow, Context, Result};
use metrics_lib::config::default_config_path;
use metrics_lib::inventory::read_instance_ids;
use metrics_lib::{
    write_json, write_xlsx, Endpoints, InstanceProcessor, MetricWindow, OciClient, OciConfig,
    ProcessReport, RequestSigner,
};
use std::io::ErrorKind;
use std::time::Duration;
use tracing::info;

use crate::output::{print_failure, print_success};
use crate::Cli;

/// Run the export; any error returned here is fatal
pub async fn run(cli: &Cli) -> Result<ProcessReport> {
    let config_path = match &cli.config_file {
        Some(path) => path.clone(),
        None => default_config_path().context("Failed to load OCI config")?,
    };
    let config = OciConfig::load(&config_path, &cli.config_profile)
        .context("Failed to load OCI config")?;
    let signer = RequestSigner::from_config(&config).context("Failed to load OCI API key")?;

    let endpoints = endpoints(cli, &config.region).context("Invalid service endpoint")?;
    let client = OciClient::new(signer, endpoints, Duration::from_secs(cli.timeout_secs))
        .context("Failed to create OCI client")?;
    info!(
        compute = %client.endpoints().compute,
        monitoring = %client.endpoints().monitoring,
        "Using service endpoints"
    );

    let instance_ids = read_instance_ids(&cli.input).map_err(|e| match e.kind() {
        ErrorKind::NotFound => anyhow!("Input file not found: {}", cli.input.display()),
        _ => anyhow::Error::new(e).context(format!(
            "Failed to read input file {}",
            cli.input.display()
        )),
    })?;
    info!(count = instance_ids.len(), "Loaded instance identifiers");

    let window = MetricWindow::with_lookback(i64::from(cli.window_secs));
    let processor = InstanceProcessor::new(&client, &client, window);
    let report = processor.process_all(&instance_ids).await;

    for failure in &report.failures {
        print_failure(&failure.instance_id, &failure.error);
    }

    write_json(&cli.output_json, &report.records).context("Failed to save JSON output")?;
    print_success(&format!("JSON output saved to {}", cli.output_json.display()));

    write_xlsx(&cli.output_xlsx, &report.records).context("Failed to save Excel output")?;
    print_success(&format!("Excel output saved to {}", cli.output_xlsx.display()));

    Ok(report)
}

/// Region endpoints with any command-line overrides applied
fn endpoints(cli: &Cli, region: &str) -> Result<Endpoints> {
    let mut endpoints = Endpoints::for_region(region)?;
    if let Some(compute) = &cli.compute_endpoint {
        endpoints = endpoints.with_compute(compute)?;
    }
    if let Some(monitoring) = &cli.monitoring_endpoint {
        endpoints = endpoints.with_monitoring(monitoring)?;
    }
    Ok(endpoints)
}

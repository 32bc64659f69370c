//! Console output utilities

use colored::Colorize;
use metrics_lib::{AgentStatus, InstanceRecord, ProcessReport};
use tabled::{settings::Style, Table, Tabled};

/// Row for the summary table
#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "OCID")]
    ocid: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Agent")]
    agent: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Time")]
    time: String,
}

impl From<&InstanceRecord> for RecordRow {
    fn from(record: &InstanceRecord) -> Self {
        Self {
            name: record.name.clone(),
            ocid: record.ocid.clone(),
            cpu: record.usage_ocpu.clone(),
            memory: record.usage_memory.clone(),
            agent: color_agent(record.oracle_agent),
            state: color_state(&record.machine_status),
            time: record.uat_time.clone(),
        }
    }
}

/// Print the processed records and totals
pub fn print_summary(report: &ProcessReport) {
    if report.records.is_empty() {
        print_warning("No instances processed");
    } else {
        let rows: Vec<RecordRow> = report.records.iter().map(RecordRow::from).collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    println!(
        "\nTotal: {} processed, {} skipped",
        report.records.len(),
        report.failures.len()
    );
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a fatal error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a skipped instance
pub fn print_failure(instance_id: &str, error: &str) {
    println!(
        "{} Error fetching data for {}: {}",
        "✗".red().bold(),
        instance_id,
        error
    );
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Color agent status
fn color_agent(status: AgentStatus) -> String {
    match status {
        AgentStatus::Running => status.as_str().green().to_string(),
        AgentStatus::EnabledNotRunning => status.as_str().yellow().to_string(),
        AgentStatus::Disabled => status.as_str().red().to_string(),
    }
}

/// Color lifecycle state based on value
fn color_state(state: &str) -> String {
    match state.to_uppercase().as_str() {
        "RUNNING" => state.green().to_string(),
        "STOPPED" | "TERMINATED" | "TERMINATING" => state.red().to_string(),
        _ => state.yellow().to_string(),
    }
}

//! Per-instance processing
//!
//! For each identifier: fetch instance metadata, read CPU and memory
//! utilization, classify the monitoring agent, and build an [`InstanceRecord`].
//! An instance whose metadata cannot be fetched, or that reports no agent
//! plugin list, is skipped and reported as an [`InstanceFailure`]; there are
//! no retries.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::client::{ComputeApi, MonitoringApi, OciError};
use crate::metrics::{MetricFetcher, MetricQuery, MetricWindow};
use crate::models::{format_percent, AgentStatus, Instance, InstanceRecord};

/// Desired state value that marks the monitoring plugin as enabled
pub const ENABLED: &str = "ENABLED";

/// Classify the monitoring agent from its desired state and latest metrics
pub fn classify_agent(desired_state: Option<&str>, cpu: f64, memory: f64) -> AgentStatus {
    match desired_state {
        Some(ENABLED) if cpu > 0.0 || memory > 0.0 => AgentStatus::Running,
        Some(ENABLED) => AgentStatus::EnabledNotRunning,
        _ => AgentStatus::Disabled,
    }
}

/// Build the exported record for an instance
pub fn build_record(
    instance: &Instance,
    cpu: f64,
    memory: f64,
    now: DateTime<Utc>,
) -> InstanceRecord {
    InstanceRecord {
        name: instance.display_name.clone(),
        ocid: instance.id.clone(),
        usage_ocpu: format_percent(cpu),
        usage_memory: format_percent(memory),
        oracle_agent: classify_agent(instance.monitoring_desired_state(), cpu, memory),
        machine_status: instance.lifecycle_state.clone(),
        uat_time: now.format("%H:%M:%S UTC").to_string(),
    }
}

/// An instance that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceFailure {
    pub instance_id: String,
    pub error: String,
}

/// Result of processing an identifier list
#[derive(Debug, Clone, Default)]
pub struct ProcessReport {
    /// Records in input order
    pub records: Vec<InstanceRecord>,
    /// Skipped instances in input order
    pub failures: Vec<InstanceFailure>,
}

/// Processes instances one at a time against the compute and monitoring APIs
pub struct InstanceProcessor<'a, C: ComputeApi + ?Sized, M: MonitoringApi + ?Sized> {
    compute: &'a C,
    metrics: MetricFetcher<'a, M>,
}

impl<'a, C: ComputeApi + ?Sized, M: MonitoringApi + ?Sized> InstanceProcessor<'a, C, M> {
    pub fn new(compute: &'a C, monitoring: &'a M, window: MetricWindow) -> Self {
        Self {
            compute,
            metrics: MetricFetcher::new(monitoring, window),
        }
    }

    /// Build the record for one instance
    pub async fn process_instance(&self, instance_id: &str) -> Result<InstanceRecord, OciError> {
        let instance = self.compute.get_instance(instance_id).await?;
        if instance.agent_plugins().is_none() {
            return Err(OciError::MissingAgentConfig(instance_id.to_string()));
        }

        let cpu = self
            .metrics
            .fetch_value(&instance.compartment_id, &MetricQuery::cpu_utilization(instance_id))
            .await;
        let memory = self
            .metrics
            .fetch_value(&instance.compartment_id, &MetricQuery::memory_utilization(instance_id))
            .await;

        Ok(build_record(&instance, cpu, memory, Utc::now()))
    }

    /// Process every identifier in order, skipping the ones that fail
    pub async fn process_all(&self, instance_ids: &[String]) -> ProcessReport {
        let mut report = ProcessReport::default();

        for instance_id in instance_ids {
            match self.process_instance(instance_id).await {
                Ok(record) => {
                    info!(
                        instance_id = %instance_id,
                        agent = %record.oracle_agent,
                        "Processed instance"
                    );
                    report.records.push(record);
                }
                Err(e) => {
                    warn!(instance_id = %instance_id, error = %e, "Skipping instance");
                    report.failures.push(InstanceFailure {
                        instance_id: instance_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

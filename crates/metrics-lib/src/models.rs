//! Core data models for the metrics exporter
//!
//! Wire types mirror the provider's REST payloads (camelCase JSON). The
//! exported record keeps the column names used by the JSON and spreadsheet
//! outputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plugin whose desired state decides whether the monitoring agent should run
pub const MONITORING_PLUGIN_NAME: &str = "Compute Instance Monitoring";

/// Column names shared by every output format, in output order
pub const RECORD_HEADERS: [&str; 7] = [
    "Name",
    "OCID",
    "UsageOCPU",
    "UsageMemory",
    "OracleAgent",
    "MachineStatus",
    "UATTime",
];

/// Compute instance as returned by `GetInstance`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub compartment_id: String,
    pub lifecycle_state: String,
    #[serde(default)]
    pub agent_config: Option<InstanceAgentConfig>,
}

impl Instance {
    /// Agent plugin list, absent when the instance reports no agent config
    pub fn agent_plugins(&self) -> Option<&[PluginConfig]> {
        self.agent_config.as_ref()?.plugins_config.as_deref()
    }

    /// Desired state of the monitoring plugin, if it is listed
    pub fn monitoring_desired_state(&self) -> Option<&str> {
        self.agent_plugins()?
            .iter()
            .find(|plugin| plugin.name == MONITORING_PLUGIN_NAME)?
            .desired_state
            .as_deref()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceAgentConfig {
    #[serde(default)]
    pub is_monitoring_disabled: Option<bool>,
    #[serde(default)]
    pub is_management_disabled: Option<bool>,
    #[serde(default)]
    pub are_all_plugins_disabled: Option<bool>,
    #[serde(default)]
    pub plugins_config: Option<Vec<PluginConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    pub name: String,
    #[serde(default)]
    pub desired_state: Option<String>,
}

/// Request body for `SummarizeMetricsData`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeMetricsDataDetails {
    pub namespace: String,
    pub query: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub resolution: String,
}

/// One metric series in a `SummarizeMetricsData` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricData {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub aggregated_datapoints: Vec<AggregatedDatapoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedDatapoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Derived health of the monitoring agent on an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    /// Plugin enabled and at least one metric reported a nonzero value
    #[serde(rename = "RUNNING")]
    Running,
    /// Plugin enabled but both metrics came back zero
    #[serde(rename = "ENABLED but not running")]
    EnabledNotRunning,
    /// Plugin not enabled
    #[serde(rename = "DISABLED")]
    Disabled,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Running => "RUNNING",
            AgentStatus::EnabledNotRunning => "ENABLED but not running",
            AgentStatus::Disabled => "DISABLED",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exported row, built once per successfully processed instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "OCID")]
    pub ocid: String,
    #[serde(rename = "UsageOCPU")]
    pub usage_ocpu: String,
    #[serde(rename = "UsageMemory")]
    pub usage_memory: String,
    #[serde(rename = "OracleAgent")]
    pub oracle_agent: AgentStatus,
    #[serde(rename = "MachineStatus")]
    pub machine_status: String,
    #[serde(rename = "UATTime")]
    pub uat_time: String,
}

impl InstanceRecord {
    /// Cell values in [`RECORD_HEADERS`] order
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.name,
            &self.ocid,
            &self.usage_ocpu,
            &self.usage_memory,
            self.oracle_agent.as_str(),
            &self.machine_status,
            &self.uat_time,
        ]
    }
}

/// Format a utilization value the way the outputs present it
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_deserializes_provider_payload() {
        let json = r#"{
            "id": "ocid1.instance.oc1..aaa",
            "displayName": "web-01",
            "compartmentId": "ocid1.compartment.oc1..bbb",
            "lifecycleState": "RUNNING",
            "shape": "VM.Standard.E4.Flex",
            "agentConfig": {
                "isMonitoringDisabled": false,
                "pluginsConfig": [
                    {"name": "Bastion", "desiredState": "DISABLED"},
                    {"name": "Compute Instance Monitoring", "desiredState": "ENABLED"}
                ]
            }
        }"#;

        let instance: Instance = serde_json::from_str(json).unwrap();
        assert_eq!(instance.display_name, "web-01");
        assert_eq!(instance.lifecycle_state, "RUNNING");
        assert_eq!(instance.monitoring_desired_state(), Some("ENABLED"));
    }

    #[test]
    fn test_monitoring_desired_state_missing() {
        let json = r#"{
            "id": "ocid1.instance.oc1..aaa",
            "displayName": "web-01",
            "compartmentId": "ocid1.compartment.oc1..bbb",
            "lifecycleState": "STOPPED"
        }"#;

        let instance: Instance = serde_json::from_str(json).unwrap();
        assert!(instance.agent_plugins().is_none());
        assert_eq!(instance.monitoring_desired_state(), None);
    }

    #[test]
    fn test_monitoring_plugin_not_listed() {
        let json = r#"{
            "id": "ocid1.instance.oc1..aaa",
            "displayName": "web-01",
            "compartmentId": "ocid1.compartment.oc1..bbb",
            "lifecycleState": "RUNNING",
            "agentConfig": {
                "pluginsConfig": [{"name": "Bastion", "desiredState": "ENABLED"}]
            }
        }"#;

        let instance: Instance = serde_json::from_str(json).unwrap();
        assert_eq!(instance.agent_plugins().map(<[_]>::len), Some(1));
        assert_eq!(instance.monitoring_desired_state(), None);
    }

    #[test]
    fn test_record_serializes_with_column_names() {
        let record = InstanceRecord {
            name: "web-01".to_string(),
            ocid: "ocid1.instance.oc1..aaa".to_string(),
            usage_ocpu: format_percent(12.346),
            usage_memory: format_percent(0.0),
            oracle_agent: AgentStatus::EnabledNotRunning,
            machine_status: "RUNNING".to_string(),
            uat_time: "10:00:00 UTC".to_string(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["UsageOCPU"], "12.35%");
        assert_eq!(value["UsageMemory"], "0.00%");
        assert_eq!(value["OracleAgent"], "ENABLED but not running");

        let json = serde_json::to_string(&record).unwrap();
        let positions: Vec<usize> = RECORD_HEADERS
            .iter()
            .map(|h| json.find(&format!("\"{}\"", h)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_record_cells_follow_headers() {
        let record = InstanceRecord {
            name: "db".to_string(),
            ocid: "ocid1.instance.oc1..ccc".to_string(),
            usage_ocpu: "1.00%".to_string(),
            usage_memory: "2.00%".to_string(),
            oracle_agent: AgentStatus::Running,
            machine_status: "RUNNING".to_string(),
            uat_time: "00:00:01 UTC".to_string(),
        };

        assert_eq!(
            record.cells(),
            [
                "db",
                "ocid1.instance.oc1..ccc",
                "1.00%",
                "2.00%",
                "RUNNING",
                "RUNNING",
                "00:00:01 UTC"
            ]
        );
    }
}

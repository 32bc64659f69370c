use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use super::OutputError;
use crate::models::InstanceRecord;

/// Write records as a pretty-printed JSON array
pub fn write_json(path: &Path, records: &[InstanceRecord]) -> Result<(), OutputError> {
    let file = File::create(path).map_err(|e| OutputError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush().map_err(|e| OutputError::io(path, e))?;

    debug!(path = %path.display(), records = records.len(), "Wrote JSON output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgentStatus;

    fn record(name: &str, status: AgentStatus) -> InstanceRecord {
        InstanceRecord {
            name: name.to_string(),
            ocid: format!("ocid1.instance.oc1..{}", name),
            usage_ocpu: "1.50%".to_string(),
            usage_memory: "20.00%".to_string(),
            oracle_agent: status,
            machine_status: "RUNNING".to_string(),
            uat_time: "12:00:00 UTC".to_string(),
        }
    }

    #[test]
    fn test_write_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let records = vec![
            record("web", AgentStatus::Running),
            record("db", AgentStatus::Disabled),
        ];

        write_json(&path, &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[\n  {\n    \"Name\": \"web\""));

        let parsed: Vec<InstanceRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, records);

        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(raw[1]["OracleAgent"], "DISABLED");
    }

    #[test]
    fn test_write_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");

        write_json(&path, &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.json");

        assert!(matches!(write_json(&path, &[]), Err(OutputError::Io { .. })));
    }
}

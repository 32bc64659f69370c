//! Instance identifier list loading

use std::io;
use std::path::Path;

/// Read instance identifiers, one per line
///
/// Surrounding whitespace is trimmed and blank lines are dropped. File order
/// and duplicates are preserved.
pub fn read_instance_ids(path: &Path) -> io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_instance_ids(&content))
}

pub fn parse_instance_ids(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

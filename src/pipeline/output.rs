use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{ConvertError, Result};

/// Write `value` as pretty-printed JSON, creating parent directories and replacing any existing
/// file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let json_content = serde_json::to_string_pretty(value)?;
    fs::write(path, json_content).map_err(|e| ConvertError::io(path, e))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Write the anomaly report of a run: one line per anomaly and a closing summary.
pub fn write_anomalies(path: &Path, anomalies: &[String], records_inspected: usize) -> Result<()> {
    ensure_parent(path)?;
    let mut report = anomalies.join("\n");
    report.push_str("\n\n---\n");
    report.push_str(&format!(
        "Total anomalies: {} across {} records inspected\n",
        anomalies.len(),
        records_inspected
    ));
    fs::write(path, report).map_err(|e| ConvertError::io(path, e))
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))
        }
        _ => Ok(()),
    }
}

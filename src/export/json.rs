//! JSON run report for scripting around multicode

use crate::error::{MulticodeError, Result};
use crate::pipeline::RunSummary;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Report schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level report structure
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version for forward compatibility
    pub version: String,
    /// multicode version that generated this file
    pub generator_version: String,
    /// Timestamp of the report
    pub generated_at: String,
    /// Queue entries built
    pub total: usize,
    pub encoded: usize,
    pub failed: Vec<FailureJson>,
    /// Files that were skipped because their format was not recognized
    pub unclassified: Vec<String>,
    pub elapsed_secs: f64,
    /// Selected profile names, in order
    pub profiles: Vec<String>,
}

/// One failed entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureJson {
    /// Entry sequence number
    pub number: usize,
    pub path: String,
    pub error: String,
}

impl RunReport {
    pub fn from_summary(summary: &RunSummary) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            total: summary.total,
            encoded: summary.encoded(),
            failed: summary
                .failures
                .iter()
                .map(|f| FailureJson {
                    number: f.entry.number,
                    path: f.path().to_string_lossy().to_string(),
                    error: f.error.to_string(),
                })
                .collect(),
            unclassified: summary
                .unclassified
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect(),
            elapsed_secs: summary.elapsed.as_secs_f64(),
            profiles: summary.profiles.clone(),
        }
    }
}

/// Write the run report to a JSON file
///
/// Uses atomic write pattern: writes to a temp file first, then renames.
pub fn write_report(summary: &RunSummary, output_path: &Path) -> Result<()> {
    let temp_path = output_path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| MulticodeError::ReportError {
        path: output_path.to_path_buf(),
        reason: format!("Failed to create temp file: {}", e),
    })?;

    let writer = BufWriter::new(file);
    let report = RunReport::from_summary(summary);

    serde_json::to_writer_pretty(writer, &report).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        MulticodeError::ReportError {
            path: output_path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        MulticodeError::ReportError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    info!("Wrote run report to {}", output_path.display());

    Ok(())
}

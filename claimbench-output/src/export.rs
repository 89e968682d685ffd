//! Machine-readable export of a run summary

use crate::errors::ExportError;
use crate::summary::Summary;
use crate::threshold::{all_passed, ThresholdResult};
use chrono::{DateTime, Utc};
use claimbench_core::TestKind;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Everything a run leaves behind for later inspection
#[derive(Debug, Clone, Serialize)]
pub struct RunExport {
    pub generated_at: DateTime<Utc>,
    pub test_kind: TestKind,
    pub test_run: String,
    pub passed: bool,
    pub summary: Summary,
    pub thresholds: Vec<ThresholdResult>,
}

impl RunExport {
    pub fn new(
        test_kind: TestKind,
        test_run: impl Into<String>,
        summary: Summary,
        thresholds: Vec<ThresholdResult>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            test_kind,
            test_run: test_run.into(),
            passed: all_passed(&thresholds),
            summary,
            thresholds,
        }
    }

    /// Write the export as pretty JSON, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<(), ExportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        info!(path = %path.display(), passed = self.passed, "Summary exported");
        Ok(())
    }
}

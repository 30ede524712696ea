//! Machine-readable record of one conversion run.

use super::output::OutputPaths;
use super::summary::DatasetSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Name of the producing software.
pub const PRODUCER_NAME: &str = "shar-toolkit";

/// Producer metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
}

impl Default for Producer {
    fn default() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Unique identifier of this run
    pub run_id: Uuid,
    pub producer: Producer,
    /// When the last table was committed
    pub finished_at: DateTime<Utc>,
    pub dataset_path: PathBuf,
    pub outputs: OutputPaths,
    pub subjects: usize,
    pub sequences: usize,
    pub samples: usize,
    /// Sequences present in the sensor matrix but absent from the metadata
    pub orphan_sequences_dropped: usize,
    pub summary: DatasetSummary,
}

impl ConversionReport {
    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

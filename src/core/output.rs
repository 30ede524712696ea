//! CSV emission with all-or-nothing replacement of the output files.
//!
//! Each table is first written to a temporary file next to its
//! destination. Only when every table has been written are the temporaries
//! renamed into place, so a failed run never leaves a fresh but partial
//! table behind.

use super::error::ConvertError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SUBJECTS_CSV: &str = "subject_metadata.csv";
pub const SEQUENCES_CSV: &str = "sequence_metadata.csv";
pub const SENSORS_CSV: &str = "accel_timeseries.csv";

/// Destinations of the three output tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub subjects: PathBuf,
    pub sequences: PathBuf,
    pub sensors: PathBuf,
}

impl OutputPaths {
    /// Default file names under one directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            subjects: dir.join(SUBJECTS_CSV),
            sequences: dir.join(SEQUENCES_CSV),
            sensors: dir.join(SENSORS_CSV),
        }
    }
}

/// A fully written table waiting to be moved onto its destination.
pub struct StagedTable {
    temp: NamedTempFile,
    dest: PathBuf,
    rows: usize,
}

impl StagedTable {
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Rename the temporary file onto its destination.
    pub fn commit(self) -> Result<PathBuf, ConvertError> {
        let dest = self.dest;
        self.temp
            .persist(&dest)
            .map_err(|e| ConvertError::Io {
                path: dest.clone(),
                source: e.error,
            })?;
        Ok(dest)
    }
}

/// Write `columns` then one row per record into a temporary file beside `dest`.
pub fn stage_table<T: Serialize>(
    dest: &Path,
    columns: &[&str],
    records: &[T],
) -> Result<StagedTable, ConvertError> {
    let io_err = |source| ConvertError::Io {
        path: dest.to_path_buf(),
        source,
    };

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(io_err)?;

    let mut temp = NamedTempFile::new_in(&parent).map_err(io_err)?;
    {
        // Header written by hand so empty tables still carry their columns.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(temp.as_file_mut());
        writer.write_record(columns)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush().map_err(io_err)?;
    }

    tracing::debug!(dest = %dest.display(), rows = records.len(), "Staged table");

    Ok(StagedTable {
        temp,
        dest: dest.to_path_buf(),
        rows: records.len(),
    })
}

/// Commit staged tables in order.
pub fn commit_all(staged: Vec<StagedTable>) -> Result<Vec<PathBuf>, ConvertError> {
    staged.into_iter().map(StagedTable::commit).collect()
}

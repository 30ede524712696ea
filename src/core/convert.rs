//! The end-to-end conversion: raw MAT files in, three CSV tables out.

use super::error::ConvertError;
use super::output::{commit_all, stage_table, OutputPaths};
use super::raw::RawDataset;
use super::records::{SensorSample, SequenceRecord, SubjectRecord};
use super::report::{ConversionReport, Producer};
use super::summary::DatasetSummary;
use super::transform::{
    build_sequence_table, build_subject_table, join_subjects, unpack_sensor_matrix,
};
use chrono::Utc;
use std::path::Path;
use uuid::Uuid;

/// The three tables derived from one raw dataset.
#[derive(Debug, Clone)]
pub struct ConvertedTables {
    pub subjects: Vec<SubjectRecord>,
    pub sequences: Vec<SequenceRecord>,
    pub samples: Vec<SensorSample>,
    /// Distinct sequence ids dropped by the subject join
    pub orphan_sequences: usize,
}

/// Derive all output tables from loaded raw inputs.
pub fn build_tables(raw: &RawDataset) -> Result<ConvertedTables, ConvertError> {
    raw.validate()?;

    let subjects = build_subject_table(&raw.subjects);
    let sequences = build_sequence_table(&raw.labels, &raw.category_names)?;
    let timesteps = unpack_sensor_matrix(&raw.sensor);
    let (samples, orphan_sequences) = join_subjects(&timesteps, &sequences);

    if orphan_sequences > 0 {
        tracing::warn!(
            orphan_sequences,
            "Sensor sequences without metadata were dropped"
        );
    }

    Ok(ConvertedTables {
        subjects,
        sequences,
        samples,
        orphan_sequences,
    })
}

/// Write the three tables. No destination is touched until every table is
/// fully written; the final renames happen one after another.
pub fn write_tables(tables: &ConvertedTables, outputs: &OutputPaths) -> Result<(), ConvertError> {
    let staged = vec![
        stage_table(&outputs.subjects, &SubjectRecord::COLUMNS, &tables.subjects)?,
        stage_table(&outputs.sequences, &SequenceRecord::COLUMNS, &tables.sequences)?,
        stage_table(&outputs.sensors, &SensorSample::COLUMNS, &tables.samples)?,
    ];
    for path in commit_all(staged)? {
        tracing::info!(path = %path.display(), "Wrote table");
    }
    Ok(())
}

/// Convert the raw dataset under `dataset_dir` into the three output tables.
pub fn convert(dataset_dir: &Path, outputs: &OutputPaths) -> Result<ConversionReport, ConvertError> {
    tracing::info!(dataset = %dataset_dir.display(), "Loading raw dataset");
    let raw = RawDataset::load(dataset_dir)?;
    tracing::info!(
        subjects = raw.subjects.len(),
        sequences = raw.num_sequences(),
        "Loaded raw dataset"
    );

    let tables = build_tables(&raw)?;
    write_tables(&tables, outputs)?;

    Ok(ConversionReport {
        run_id: Uuid::new_v4(),
        producer: Producer::default(),
        finished_at: Utc::now(),
        dataset_path: dataset_dir.to_path_buf(),
        outputs: outputs.clone(),
        subjects: tables.subjects.len(),
        sequences: tables.sequences.len(),
        samples: tables.samples.len(),
        orphan_sequences_dropped: tables.orphan_sequences,
        summary: DatasetSummary::from_tables(&tables.sequences, &tables.samples),
    })
}

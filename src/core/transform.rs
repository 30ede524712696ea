//! Pure table transformations from raw inputs to output records.

use super::categories::{canonical_category_name, is_horizontal_motion, NUM_CATEGORIES};
use super::error::ConvertError;
use super::raw::{RawSubject, NUM_AXES};
use super::records::{SensorSample, SequenceRecord, SubjectRecord, TimestepRow};
use crate::mat::NumericArray;
use std::collections::HashMap;

// Label matrix columns
const CATEGORY_COL: usize = 0;
const SUBJECT_COL: usize = 1;
const POCKET_COL: usize = 2;

/// Whether a raw gender code denotes a male subject.
///
/// Only the exact code "F" (after trimming whitespace) is female.
pub fn is_male(gender_code: &str) -> bool {
    gender_code.trim() != "F"
}

/// Build the subject table with 1-based ids in input order.
pub fn build_subject_table(subjects: &[RawSubject]) -> Vec<SubjectRecord> {
    subjects
        .iter()
        .enumerate()
        .map(|(i, s)| SubjectRecord {
            subject_id: i as u32 + 1,
            age_yr: s.age,
            height_cm: s.height_cm,
            weight_kg: s.weight_kg,
            is_male: u8::from(is_male(&s.gender_code)),
            gender_name: s.gender_code.trim().to_string(),
        })
        .collect()
}

/// Convert a stored label value to an integer, rejecting fractional or
/// non-finite values.
fn label_int(value: f64, sequence_id: usize, field: &'static str) -> Result<i64, ConvertError> {
    if value.is_finite() && value.fract() == 0.0 {
        Ok(value as i64)
    } else {
        Err(ConvertError::InvalidLabel {
            sequence_id,
            field,
            value,
        })
    }
}

/// Build the per-sequence metadata table from the N x 3 label matrix.
///
/// `sequence_id` is the label row index. Category and pocket ids are
/// shifted from 1-based to 0-based and range-checked.
pub fn build_sequence_table(
    labels: &NumericArray,
    category_names: &[String],
) -> Result<Vec<SequenceRecord>, ConvertError> {
    (0..labels.rows())
        .map(|sequence_id| {
            let cell = |col: usize| labels.get(sequence_id, col).unwrap_or(f64::NAN);

            let raw_category = cell(CATEGORY_COL);
            let category_id = label_int(raw_category, sequence_id, "raw_category_id")? - 1;
            if !(0..NUM_CATEGORIES as i64).contains(&category_id) {
                return Err(ConvertError::InvalidLabel {
                    sequence_id,
                    field: "category_id",
                    value: category_id as f64,
                });
            }

            let raw_pocket = cell(POCKET_COL);
            let pocket_id = label_int(raw_pocket, sequence_id, "pocket")? - 1;
            if !(0..=1).contains(&pocket_id) {
                return Err(ConvertError::InvalidLabel {
                    sequence_id,
                    field: "pocket_id",
                    value: pocket_id as f64,
                });
            }

            let subject_id = label_int(cell(SUBJECT_COL), sequence_id, "subject_id")?;
            let subject_id = u32::try_from(subject_id).map_err(|_| ConvertError::InvalidLabel {
                sequence_id,
                field: "subject_id",
                value: subject_id as f64,
            })?;

            let raw_name = category_names.get(category_id as usize).ok_or_else(|| {
                ConvertError::InputMismatch(format!(
                    "no category name for category id {category_id}"
                ))
            })?;
            let category_name = canonical_category_name(raw_name).to_string();
            let horizontal = is_horizontal_motion(&category_name);

            Ok(SequenceRecord {
                subject_id,
                sequence_id,
                pocket_id: pocket_id as u8,
                horizontal_motion_binary_label: u8::from(horizontal),
                category_name,
                category_id: category_id as u8,
            })
        })
        .collect()
}

/// Reshape one flat sensor row into per-timestep `[x, y, z]` readings.
///
/// The row holds the three axes as contiguous blocks,
/// `[x_0..x_T, y_0..y_T, z_0..z_T]`, not interleaved per timestep.
pub fn unpack_sequence(row: &[f64]) -> Vec<[f64; NUM_AXES]> {
    let len = row.len() / NUM_AXES;
    let (xs, rest) = row.split_at(len);
    let (ys, zs) = rest.split_at(len);
    xs.iter()
        .zip(ys)
        .zip(zs)
        .map(|((&x, &y), &z)| [x, y, z])
        .collect()
}

/// Unpack every row of the sensor matrix, in row then timestep order.
pub fn unpack_sensor_matrix(sensor: &NumericArray) -> Vec<TimestepRow> {
    let mut out = Vec::with_capacity(sensor.rows() * (sensor.cols() / NUM_AXES));
    for sequence_id in 0..sensor.rows() {
        let Some(row) = sensor.row(sequence_id) else {
            continue;
        };
        out.extend(
            unpack_sequence(&row)
                .into_iter()
                .enumerate()
                .map(|(timestep, acc)| TimestepRow {
                    sequence_id,
                    timestep,
                    acc,
                }),
        );
    }
    out
}

/// Attach subject ids to unpacked timesteps by sequence id.
///
/// This is an inner join: timesteps whose sequence id has no entry in
/// `sequences` are dropped. Returns the joined samples and the number of
/// distinct sequence ids dropped.
pub fn join_subjects(
    rows: &[TimestepRow],
    sequences: &[SequenceRecord],
) -> (Vec<SensorSample>, usize) {
    let subject_by_sequence: HashMap<usize, u32> = sequences
        .iter()
        .map(|s| (s.sequence_id, s.subject_id))
        .collect();

    let mut samples = Vec::with_capacity(rows.len());
    let mut dropped = Vec::new();
    for row in rows {
        match subject_by_sequence.get(&row.sequence_id) {
            Some(&subject_id) => samples.push(SensorSample {
                subject_id,
                sequence_id: row.sequence_id,
                timestep: row.timestep,
                acc_x: row.acc[0],
                acc_y: row.acc[1],
                acc_z: row.acc[2],
            }),
            None => {
                if dropped.last() != Some(&row.sequence_id) {
                    dropped.push(row.sequence_id);
                }
            }
        }
    }
    dropped.sort_unstable();
    dropped.dedup();

    (samples, dropped.len())
}

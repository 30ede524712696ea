//! Output records. Field order is the column order of the written tables.

use serde::Serialize;

/// One row of the subject table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectRecord {
    /// 1-based, assigned in input order
    pub subject_id: u32,
    pub age_yr: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
    /// 0 for gender code "F", 1 otherwise
    pub is_male: u8,
    /// Trimmed gender code; not a written column
    #[serde(skip)]
    pub gender_name: String,
}

impl SubjectRecord {
    pub const COLUMNS: [&'static str; 5] =
        ["subject_id", "age_yr", "height_cm", "weight_kg", "is_male"];
}

/// One row of the per-sequence metadata table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceRecord {
    pub subject_id: u32,
    /// 0-based input row index
    pub sequence_id: usize,
    /// 0 = left pocket, 1 = right pocket
    pub pocket_id: u8,
    pub horizontal_motion_binary_label: u8,
    pub category_name: String,
    /// 0-based category id; not a written column
    #[serde(skip)]
    pub category_id: u8,
}

impl SequenceRecord {
    pub const COLUMNS: [&'static str; 5] = [
        "subject_id",
        "sequence_id",
        "pocket_id",
        "horizontal_motion_binary_label",
        "category_name",
    ];
}

/// One accelerometer reading of one sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSample {
    pub subject_id: u32,
    pub sequence_id: usize,
    pub timestep: usize,
    pub acc_x: f64,
    pub acc_y: f64,
    pub acc_z: f64,
}

impl SensorSample {
    pub const COLUMNS: [&'static str; 6] = [
        "subject_id",
        "sequence_id",
        "timestep",
        "acc_x",
        "acc_y",
        "acc_z",
    ];
}

/// An unpacked timestep before it is joined to its subject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestepRow {
    pub sequence_id: usize,
    pub timestep: usize,
    pub acc: [f64; 3],
}

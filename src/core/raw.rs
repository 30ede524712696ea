//! Loading of the raw UniMiB SHAR release.
//!
//! The `data/` directory of the release holds four MAT files; only the
//! "daily living" (ADL) subset and the subject demographics are read.

use super::categories::NUM_CATEGORIES;
use super::error::ConvertError;
use crate::mat::{read_mat_file, MatArray, MatFile, NumericArray};
use std::path::Path;

pub const SUBJECTS_FILE: &str = "full_data.mat";
pub const SENSOR_FILE: &str = "adl_data.mat";
pub const LABELS_FILE: &str = "adl_labels.mat";
pub const NAMES_FILE: &str = "adl_names.mat";

/// Number of subjects in the release.
pub const NUM_SUBJECTS: usize = 30;

/// Timesteps per recorded sequence.
pub const SEQUENCE_LEN: usize = 151;

/// Accelerometer axes per timestep.
pub const NUM_AXES: usize = 3;

/// Width of one sensor-matrix row: x block, then y block, then z block.
pub const SENSOR_ROW_LEN: usize = SEQUENCE_LEN * NUM_AXES;

/// Label matrix columns: raw category id, subject id, raw pocket.
pub const LABEL_COLS: usize = 3;

// Column positions inside one `full_data` row
const GENDER_COL: usize = 1;
const AGE_COL: usize = 2;
const HEIGHT_COL: usize = 3;
const WEIGHT_COL: usize = 4;

/// Demographic fields of one subject, as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSubject {
    pub gender_code: String,
    pub age: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
}

/// The four raw inputs, shape-checked.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub subjects: Vec<RawSubject>,
    /// N x 453 sensor readings
    pub sensor: NumericArray,
    /// N x 3 labels
    pub labels: NumericArray,
    /// Raw category names ordered by raw category id
    pub category_names: Vec<String>,
}

impl RawDataset {
    /// Load and shape-check all inputs under `dir`.
    pub fn load(dir: &Path) -> Result<Self, ConvertError> {
        let subjects = load_subjects(&dir.join(SUBJECTS_FILE))?;
        let sensor = load_matrix(&dir.join(SENSOR_FILE), "adl_data")?;
        let labels = load_matrix(&dir.join(LABELS_FILE), "adl_labels")?;
        let category_names = load_category_names(&dir.join(NAMES_FILE))?;

        let dataset = Self {
            subjects,
            sensor,
            labels,
            category_names,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Number of sequences (label rows).
    pub fn num_sequences(&self) -> usize {
        self.labels.rows()
    }

    /// Check matrix widths, matching row counts, and the name table length.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.sensor.cols() != SENSOR_ROW_LEN {
            return Err(ConvertError::InputMismatch(format!(
                "sensor matrix has {} columns, expected {SENSOR_ROW_LEN}",
                self.sensor.cols()
            )));
        }
        if self.labels.cols() != LABEL_COLS {
            return Err(ConvertError::InputMismatch(format!(
                "label matrix has {} columns, expected {LABEL_COLS}",
                self.labels.cols()
            )));
        }
        if self.sensor.rows() != self.labels.rows() {
            return Err(ConvertError::InputMismatch(format!(
                "sensor matrix has {} rows but label matrix has {}",
                self.sensor.rows(),
                self.labels.rows()
            )));
        }
        if self.category_names.len() < NUM_CATEGORIES {
            return Err(ConvertError::InputMismatch(format!(
                "category name table has {} entries, expected {NUM_CATEGORIES}",
                self.category_names.len()
            )));
        }
        Ok(())
    }
}

fn open(path: &Path) -> Result<MatFile, ConvertError> {
    if !path.exists() {
        return Err(ConvertError::missing(path, "file not found"));
    }
    read_mat_file(path).map_err(|e| ConvertError::from_mat(path, e))
}

fn variable<'a>(file: &'a MatFile, path: &Path, name: &str) -> Result<&'a MatArray, ConvertError> {
    file.get(name)
        .ok_or_else(|| ConvertError::missing(path, format!("variable '{name}' not present")))
}

/// Load a numeric matrix variable.
pub fn load_matrix(path: &Path, name: &str) -> Result<NumericArray, ConvertError> {
    let file = open(path)?;
    let array = variable(&file, path, name)?;
    match array.as_numeric() {
        Some(m) => {
            tracing::debug!(file = %path.display(), variable = name, dims = ?m.dims, "Loaded matrix");
            Ok(m.clone())
        }
        None => Err(ConvertError::InputMismatch(format!(
            "'{name}' in {} is a {} array, expected numeric",
            path.display(),
            array.class_name()
        ))),
    }
}

/// Load the first [`NUM_SUBJECTS`] rows of the `full_data` cell array.
pub fn load_subjects(path: &Path) -> Result<Vec<RawSubject>, ConvertError> {
    let file = open(path)?;
    let array = variable(&file, path, "full_data")?;
    let cells = array.as_cell().ok_or_else(|| {
        ConvertError::InputMismatch(format!(
            "'full_data' in {} is a {} array, expected cell",
            path.display(),
            array.class_name()
        ))
    })?;

    if cells.rows() < NUM_SUBJECTS {
        return Err(ConvertError::missing(
            path,
            format!(
                "'full_data' holds {} subjects, expected {NUM_SUBJECTS}",
                cells.rows()
            ),
        ));
    }
    if cells.rows() > NUM_SUBJECTS {
        tracing::warn!(
            "'full_data' holds {} rows; using the first {NUM_SUBJECTS}",
            cells.rows()
        );
    }
    if cells.cols() <= WEIGHT_COL {
        return Err(ConvertError::InputMismatch(format!(
            "'full_data' has {} columns, expected at least {}",
            cells.cols(),
            WEIGHT_COL + 1
        )));
    }

    let scalar = |row: usize, col: usize, what: &str| -> Result<f64, ConvertError> {
        cells
            .get(row, col)
            .and_then(MatArray::as_numeric)
            .and_then(NumericArray::first)
            .ok_or_else(|| {
                ConvertError::InputMismatch(format!(
                    "subject {} has no numeric {what}",
                    row + 1
                ))
            })
    };

    (0..NUM_SUBJECTS)
        .map(|row| {
            let gender_code = cells
                .get(row, GENDER_COL)
                .and_then(MatArray::as_char)
                .map(|c| c.text())
                .ok_or_else(|| {
                    ConvertError::InputMismatch(format!("subject {} has no gender code", row + 1))
                })?;
            Ok(RawSubject {
                gender_code,
                age: scalar(row, AGE_COL, "age")?,
                height_cm: scalar(row, HEIGHT_COL, "height")?,
                weight_kg: scalar(row, WEIGHT_COL, "weight")?,
            })
        })
        .collect()
}

/// Load the raw category names from the `adl_names` cell array.
pub fn load_category_names(path: &Path) -> Result<Vec<String>, ConvertError> {
    let file = open(path)?;
    let array = variable(&file, path, "adl_names")?;
    match array {
        MatArray::Cell(cells) => cells
            .cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                cell.as_char().map(|c| c.text()).ok_or_else(|| {
                    ConvertError::InputMismatch(format!("category name {i} is not text"))
                })
            })
            .collect(),
        // A char matrix stores one name per row.
        MatArray::Char(chars) => Ok((0..chars.rows())
            .filter_map(|r| chars.row_string(r))
            .map(|s| s.trim_end().to_string())
            .collect()),
        other => Err(ConvertError::InputMismatch(format!(
            "'adl_names' is a {} array, expected cell",
            other.class_name()
        ))),
    }
}

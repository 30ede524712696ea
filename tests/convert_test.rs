//! End-to-end tests for the raw dataset converter

use shar_toolkit::core::categories::RAW_CATEGORY_NAMES;
use shar_toolkit::core::raw::{
    LABELS_FILE, NAMES_FILE, NUM_SUBJECTS, SENSOR_FILE, SENSOR_ROW_LEN, SEQUENCE_LEN,
    SUBJECTS_FILE,
};
use shar_toolkit::core::{convert, ConvertError, OutputPaths};
use shar_toolkit::mat::{CellArray, CharArray, MatArray, MatWriter, NumericArray};
use std::path::Path;

/// Label rows: raw category id, subject id, raw pocket.
const LABELS: [[f64; 3]; 4] = [
    [9.0, 1.0, 2.0],  // walking, right pocket
    [4.0, 3.0, 1.0],  // jumping, left pocket
    [3.0, 2.0, 2.0],  // going_up
    [7.0, 30.0, 1.0], // sitting_down
];

fn gender(subject: usize) -> &'static str {
    match subject {
        0 => " F",
        1 => "F",
        2 => "M",
        3 => "f",
        _ => "M",
    }
}

/// Sensor row whose x, y and z blocks are distinguishable per sequence.
fn sensor_row(sequence: usize) -> Vec<f64> {
    (0..SENSOR_ROW_LEN)
        .map(|i| sequence as f64 * 10_000.0 + i as f64)
        .collect()
}

fn write_subjects(dir: &Path, rows: usize) {
    let rows = (0..rows)
        .map(|i| {
            vec![
                MatArray::Char(CharArray::from_text(&format!("subject{}", i + 1))),
                MatArray::Char(CharArray::from_text(gender(i))),
                MatArray::Numeric(NumericArray::scalar(20.0 + i as f64)),
                MatArray::Numeric(NumericArray::scalar(150.0 + i as f64)),
                MatArray::Numeric(NumericArray::scalar(50.0 + i as f64)),
            ]
        })
        .collect();
    let mut writer = MatWriter::new().compressed(true);
    writer.add("full_data", MatArray::Cell(CellArray::from_rows(rows)));
    writer.write_to(dir.join(SUBJECTS_FILE)).unwrap();
}

fn write_sensor(dir: &Path, rows: &[Vec<f64>]) {
    let mut writer = MatWriter::new().compressed(true);
    writer.add("adl_data", MatArray::Numeric(NumericArray::from_rows(rows)));
    writer.write_to(dir.join(SENSOR_FILE)).unwrap();
}

fn write_labels(dir: &Path, labels: &[[f64; 3]]) {
    let rows: Vec<Vec<f64>> = labels.iter().map(|r| r.to_vec()).collect();
    let mut writer = MatWriter::new();
    writer.add("adl_labels", MatArray::Numeric(NumericArray::from_rows(&rows)));
    writer.write_to(dir.join(LABELS_FILE)).unwrap();
}

fn write_names(dir: &Path) {
    let names = RAW_CATEGORY_NAMES
        .iter()
        .map(|n| MatArray::Char(CharArray::from_text(n)))
        .collect();
    let mut writer = MatWriter::new();
    writer.add("adl_names", MatArray::Cell(CellArray::column(names)));
    writer.write_to(dir.join(NAMES_FILE)).unwrap();
}

fn write_fixture(dir: &Path) {
    write_subjects(dir, NUM_SUBJECTS);
    let sensor: Vec<Vec<f64>> = (0..LABELS.len()).map(sensor_row).collect();
    write_sensor(dir, &sensor);
    write_labels(dir, &LABELS);
    write_names(dir);
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

fn num(field: &str) -> f64 {
    field.parse().unwrap()
}

#[test]
fn test_convert_writes_three_tables() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(data.path());
    let outputs = OutputPaths::in_dir(out.path());

    let report = convert(data.path(), &outputs).unwrap();
    assert_eq!(report.subjects, NUM_SUBJECTS);
    assert_eq!(report.sequences, LABELS.len());
    assert_eq!(report.samples, LABELS.len() * SEQUENCE_LEN);
    assert_eq!(report.orphan_sequences_dropped, 0);

    // Subjects
    let (headers, rows) = read_csv(&outputs.subjects);
    assert_eq!(
        headers,
        vec!["subject_id", "age_yr", "height_cm", "weight_kg", "is_male"]
    );
    assert_eq!(rows.len(), NUM_SUBJECTS);
    assert_eq!(rows[0][0], "1");
    assert_eq!(num(&rows[0][1]), 20.0);
    assert_eq!(num(&rows[0][2]), 150.0);
    assert_eq!(num(&rows[0][3]), 50.0);
    let is_male: Vec<&str> = rows.iter().take(5).map(|r| r[4].as_str()).collect();
    assert_eq!(is_male, vec!["0", "0", "1", "1", "1"]);
    assert_eq!(rows[29][0], "30");

    // Sequences
    let (headers, rows) = read_csv(&outputs.sequences);
    assert_eq!(
        headers,
        vec![
            "subject_id",
            "sequence_id",
            "pocket_id",
            "horizontal_motion_binary_label",
            "category_name"
        ]
    );
    assert_eq!(rows.len(), LABELS.len());
    assert_eq!(rows[0], vec!["1", "0", "1", "1", "Walk"]);
    assert_eq!(rows[1], vec!["3", "1", "0", "0", "Jump"]);
    assert_eq!(rows[2], vec!["2", "2", "1", "1", "UpStairs"]);
    assert_eq!(rows[3], vec!["30", "3", "0", "0", "SitDown"]);

    // Sensor samples
    let (headers, rows) = read_csv(&outputs.sensors);
    assert_eq!(
        headers,
        vec!["subject_id", "sequence_id", "timestep", "acc_x", "acc_y", "acc_z"]
    );
    assert_eq!(rows.len(), LABELS.len() * SEQUENCE_LEN);

    let first = &rows[0];
    assert_eq!(&first[..3], &["1", "0", "0"]);
    assert_eq!(num(&first[3]), 0.0);
    assert_eq!(num(&first[4]), SEQUENCE_LEN as f64);
    assert_eq!(num(&first[5]), (2 * SEQUENCE_LEN) as f64);

    // Last timestep of sequence 1 belongs to subject 3.
    let row = &rows[2 * SEQUENCE_LEN - 1];
    assert_eq!(&row[..3], &["3", "1", "150"]);
    assert_eq!(num(&row[3]), 10_000.0 + 150.0);
    assert_eq!(num(&row[4]), 10_000.0 + (SEQUENCE_LEN + 150) as f64);
    assert_eq!(num(&row[5]), 10_000.0 + (2 * SEQUENCE_LEN + 150) as f64);
}

#[test]
fn test_convert_summary_and_report() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(data.path());
    let outputs = OutputPaths::in_dir(out.path());

    let report = convert(data.path(), &outputs).unwrap();
    assert_eq!(report.summary.subject_counts.len(), 4);
    assert_eq!(report.summary.pocket_counts, vec![(0, 2), (1, 2)]);
    assert!(report.summary.render().contains("SitDown"));

    let path = out.path().join("report.json");
    report.write_json(&path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["samples"], LABELS.len() * SEQUENCE_LEN);
    assert_eq!(json["producer"]["name"], "shar-toolkit");
    assert_eq!(json["run_id"].as_str().unwrap(), report.run_id.to_string());
}

#[test]
fn test_explicit_output_paths_and_uncompressed_inputs() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(data.path());
    // Rewrite the sensor file without compression.
    let mut writer = MatWriter::new();
    let sensor: Vec<Vec<f64>> = (0..LABELS.len()).map(sensor_row).collect();
    writer.add("adl_data", MatArray::Numeric(NumericArray::from_rows(&sensor)));
    writer.write_to(data.path().join(SENSOR_FILE)).unwrap();

    let outputs = OutputPaths {
        subjects: out.path().join("a").join("subj.csv"),
        sequences: out.path().join("b").join("seq.csv"),
        sensors: out.path().join("ts.csv"),
    };
    convert(data.path(), &outputs).unwrap();
    assert!(outputs.subjects.exists());
    assert!(outputs.sequences.exists());
    assert!(outputs.sensors.exists());
}

#[test]
fn test_missing_input_writes_nothing() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(data.path());
    std::fs::remove_file(data.path().join(LABELS_FILE)).unwrap();

    let err = convert(data.path(), &OutputPaths::in_dir(out.path())).unwrap_err();
    assert!(matches!(err, ConvertError::MissingInput { .. }));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_row_count_mismatch_writes_nothing() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(data.path());
    write_labels(data.path(), &LABELS[..3]);

    let err = convert(data.path(), &OutputPaths::in_dir(out.path())).unwrap_err();
    assert!(matches!(err, ConvertError::InputMismatch(_)));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_failed_run_keeps_previous_outputs() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(data.path());
    let outputs = OutputPaths::in_dir(out.path());
    convert(data.path(), &outputs).unwrap();
    let before = std::fs::read_to_string(&outputs.sequences).unwrap();

    let mut labels = LABELS;
    labels[2][0] = 12.0;
    write_labels(data.path(), &labels);
    let err = convert(data.path(), &outputs).unwrap_err();
    assert!(matches!(err, ConvertError::InvalidLabel { sequence_id: 2, .. }));

    assert_eq!(std::fs::read_to_string(&outputs.sequences).unwrap(), before);
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 3);
}

#[test]
fn test_unwritable_table_leaves_other_destinations_untouched() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(data.path());
    // A plain file where the sensor table's directory should be.
    let blocker = out.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let outputs = OutputPaths {
        subjects: out.path().join("subjects.csv"),
        sequences: out.path().join("sequences.csv"),
        sensors: blocker.join("ts.csv"),
    };
    let err = convert(data.path(), &outputs).unwrap_err();
    assert!(matches!(err, ConvertError::Io { .. }));
    assert!(!outputs.subjects.exists());
    assert!(!outputs.sequences.exists());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 1);
}

#[test]
fn test_wrong_sensor_width_is_mismatch() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(data.path());
    let narrow: Vec<Vec<f64>> = (0..LABELS.len()).map(|_| vec![0.0; 450]).collect();
    write_sensor(data.path(), &narrow);

    let err = convert(data.path(), &OutputPaths::in_dir(out.path())).unwrap_err();
    assert!(matches!(err, ConvertError::InputMismatch(_)));
}

#[test]
fn test_too_few_subjects_is_missing_input() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(data.path());
    write_subjects(data.path(), 20);

    let err = convert(data.path(), &OutputPaths::in_dir(out.path())).unwrap_err();
    assert!(matches!(err, ConvertError::MissingInput { .. }));
}

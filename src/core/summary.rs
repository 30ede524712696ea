//! Diagnostic summary of a conversion: value counts and per-axis statistics.
//!
//! Purely informational; nothing here feeds back into the written tables.

use super::records::{SensorSample, SequenceRecord};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt::Display;

/// How many of the most and least frequent subjects to show.
const SUBJECT_HEAD: usize = 5;
/// Maximum rows of the category and pocket tables.
const TABLE_LIMIT: usize = 15;

/// Mean and standard deviation of one accelerometer axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisStats {
    pub axis: &'static str,
    pub mean: f64,
    pub std_dev: f64,
}

/// Counts and statistics describing one converted dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    /// Sequences per subject, most frequent first
    pub subject_counts: Vec<(u32, usize)>,
    /// Sequences per category, most frequent first
    pub category_counts: Vec<(String, usize)>,
    /// Sequences per pocket, most frequent first
    pub pocket_counts: Vec<(u8, usize)>,
    pub axes: Vec<AxisStats>,
}

/// Count occurrences; order by count descending, then key ascending.
fn value_counts<K: Ord + Clone>(values: impl IntoIterator<Item = K>) -> Vec<(K, usize)> {
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut out: Vec<(K, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

impl DatasetSummary {
    pub fn from_tables(sequences: &[SequenceRecord], samples: &[SensorSample]) -> Self {
        let axis = |name: &'static str, pick: fn(&SensorSample) -> f64| {
            let values: Vec<f64> = samples.iter().map(pick).collect();
            AxisStats {
                axis: name,
                mean: values.iter().mean(),
                std_dev: values.iter().std_dev(),
            }
        };

        Self {
            subject_counts: value_counts(sequences.iter().map(|s| s.subject_id)),
            category_counts: value_counts(sequences.iter().map(|s| s.category_name.clone())),
            pocket_counts: value_counts(sequences.iter().map(|s| s.pocket_id)),
            axes: vec![
                axis("acc_x", |s| s.acc_x),
                axis("acc_y", |s| s.acc_y),
                axis("acc_z", |s| s.acc_z),
            ],
        }
    }

    /// Render the summary as the plain-text tables printed after conversion.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push('\n');
        push_title(&mut out, "subject_id | counts", 19);
        let n = self.subject_counts.len();
        push_rows(&mut out, &self.subject_counts[..n.min(SUBJECT_HEAD)]);
        out.push_str("...\n");
        push_rows(&mut out, &self.subject_counts[n.saturating_sub(SUBJECT_HEAD)..]);

        out.push('\n');
        push_title(&mut out, "category_name | counts", 22);
        push_rows(
            &mut out,
            &self.category_counts[..self.category_counts.len().min(TABLE_LIMIT)],
        );

        out.push('\n');
        push_title(&mut out, "pocket_id | counts", 19);
        push_rows(
            &mut out,
            &self.pocket_counts[..self.pocket_counts.len().min(TABLE_LIMIT)],
        );

        out.push('\n');
        push_title(&mut out, "axis | mean | std", 19);
        for a in &self.axes {
            out.push_str(&format!("{:<6} {:>10.4} {:>10.4}\n", a.axis, a.mean, a.std_dev));
        }

        out
    }
}

fn push_title(out: &mut String, title: &str, rule: usize) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(rule));
    out.push('\n');
}

fn push_rows<K: Display>(out: &mut String, rows: &[(K, usize)]) {
    let width = rows
        .iter()
        .map(|(k, _)| k.to_string().len())
        .max()
        .unwrap_or(0);
    for (k, count) in rows {
        out.push_str(&format!("{:<width$}    {count}\n", k.to_string()));
    }
}

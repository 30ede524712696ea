//! Conversion of the raw UniMiB SHAR release into tidy tables.
//!
//! This module contains:
//! - Loading of the raw MAT inputs
//! - Category renaming and the horizontal-motion label
//! - Reshaping of flat sensor rows into per-timestep readings
//! - Atomic CSV output, a diagnostic summary, and a run report

pub mod categories;
pub mod convert;
pub mod error;
pub mod output;
pub mod raw;
pub mod records;
pub mod report;
pub mod summary;
pub mod transform;

// Re-export commonly used types
pub use categories::{canonical_category_name, is_horizontal_motion};
pub use convert::{build_tables, convert, write_tables, ConvertedTables};
pub use error::ConvertError;
pub use output::OutputPaths;
pub use raw::{RawDataset, RawSubject};
pub use records::{SensorSample, SequenceRecord, SubjectRecord};
pub use report::{ConversionReport, PRODUCER_NAME};
pub use summary::DatasetSummary;

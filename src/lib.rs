//! SHAR Toolkit - data preparation and modelling for the UniMiB SHAR dataset.
//!
//! This library turns the raw MATLAB release of the UniMiB SHAR activity
//! dataset into three tidy CSV tables, and provides a configurable 1-D CNN
//! that scores fixed-length accelerometer sequences as horizontal motion or
//! not.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SHAR Toolkit                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  MAT v5     │──▶│  Raw        │──▶│  Transform  │       │
//! │  │  reader     │   │  dataset    │   │  + join     │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                              │              │
//! │                                              ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │  Binary     │◀── sequences ────── │  CSV tables │       │
//! │  │  classifier │   [B, 3, 151]       │  + report   │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use shar_toolkit::core::{convert, OutputPaths};
//! use std::path::Path;
//!
//! let outputs = OutputPaths::in_dir(Path::new("converted"));
//! let report = convert(Path::new("datasets/unimib_shar_activities/raw/data"), &outputs)
//!     .expect("conversion failed");
//! println!("{}", report.summary.render());
//! ```

pub mod config;
pub mod core;
pub mod mat;
pub mod model;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{convert, ConversionReport, ConvertError, DatasetSummary, OutputPaths};
pub use mat::{read_mat_file, MatArray, MatError, MatFile, MatWriter};
pub use model::{build_model, BinaryClassifier, ClassifierConfig, ModelError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

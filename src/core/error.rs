//! Errors raised by the dataset converter.

use crate::mat::MatError;
use std::path::PathBuf;

/// Conversion errors. Every variant aborts the run.
#[derive(Debug)]
pub enum ConvertError {
    /// An input file is absent, undecodable, or lacks the expected variable
    MissingInput { path: PathBuf, reason: String },
    /// Input tables disagree in shape
    InputMismatch(String),
    /// A label value falls outside its expected range
    InvalidLabel {
        sequence_id: usize,
        field: &'static str,
        value: f64,
    },
    /// Writing an output table failed
    Io { path: PathBuf, source: std::io::Error },
    /// Encoding a CSV row failed
    Csv(csv::Error),
}

impl ConvertError {
    pub(crate) fn missing(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        ConvertError::MissingInput {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn from_mat(path: impl Into<PathBuf>, e: MatError) -> Self {
        Self::missing(path, e)
    }
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::MissingInput { path, reason } => {
                write!(f, "Missing input {}: {reason}", path.display())
            }
            ConvertError::InputMismatch(e) => write!(f, "Input mismatch: {e}"),
            ConvertError::InvalidLabel {
                sequence_id,
                field,
                value,
            } => write!(
                f,
                "Invalid label: sequence {sequence_id} has {field} = {value}"
            ),
            ConvertError::Io { path, source } => {
                write!(f, "IO error on {}: {source}", path.display())
            }
            ConvertError::Csv(e) => write!(f, "CSV error: {e}"),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Io { source, .. } => Some(source),
            ConvertError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for ConvertError {
    fn from(e: csv::Error) -> Self {
        ConvertError::Csv(e)
    }
}

//! Errors raised while building the classifier.

/// Classifier construction errors.
///
/// Forward passes return [`candle_core::Error`] directly.
#[derive(Debug)]
pub enum ModelError {
    /// The size lists do not describe a valid layer stack
    Configuration(String),
    /// Parameter allocation failed in the tensor backend
    Backend(candle_core::Error),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Configuration(e) => write!(f, "Configuration error: {e}"),
            ModelError::Backend(e) => write!(f, "Backend error: {e}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Backend(e) => Some(e),
            ModelError::Configuration(_) => None,
        }
    }
}

impl From<candle_core::Error> for ModelError {
    fn from(e: candle_core::Error) -> Self {
        ModelError::Backend(e)
    }
}

//! Errors raised while decoding or encoding MAT files.

/// MAT-file codec errors.
#[derive(Debug)]
pub enum MatError {
    /// Reading or writing the underlying file failed
    Io(std::io::Error),
    /// The buffer ended inside the named structure
    Truncated(&'static str),
    /// A feature of the format this codec does not handle
    Unsupported(String),
    /// Structurally invalid content
    Malformed(String),
}

impl std::fmt::Display for MatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatError::Io(e) => write!(f, "IO error: {e}"),
            MatError::Truncated(what) => write!(f, "File truncated while reading {what}"),
            MatError::Unsupported(what) => write!(f, "Unsupported MAT content: {what}"),
            MatError::Malformed(what) => write!(f, "Malformed MAT content: {what}"),
        }
    }
}

impl std::error::Error for MatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MatError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MatError {
    fn from(e: std::io::Error) -> Self {
        MatError::Io(e)
    }
}

use std::path::PathBuf;

/// Errors that can occur in ruSplice.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    Parameter(String),

    #[error("I/O error: {source} ({path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("malformed CIGAR '{cigar}': {reason}")]
    MalformedEncoding { cigar: String, reason: String },

    #[error("malformed alignment record: {0}")]
    MalformedRecord(String),

    #[error("malformed region line {line}: {reason}")]
    MalformedRegionLine { line: usize, reason: String },

    #[error("junction table {path} has an unexpected shape: {reason}")]
    MissingSampleColumn { path: PathBuf, reason: String },

    #[error("annotation error: {0}")]
    Annotation(String),

    #[error("alignment retrieval error: {0}")]
    Retrieval(String),
}

impl Error {
    /// Convenience for wrapping an `io::Error` with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }

    pub(crate) fn encoding(cigar: &str, reason: impl Into<String>) -> Self {
        Self::MalformedEncoding {
            cigar: cigar.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MissingSampleColumn {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            source: err,
            path: PathBuf::from("<unknown>"),
        }
    }
}

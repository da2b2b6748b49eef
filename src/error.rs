//! Error types for the hijack scanner.
//!
//! Every variant aborts analysis of a single application. The scan driver
//! wraps them in [`ScanError`] so a multi-application sweep keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scanner operations.
#[derive(Debug, Error)]
pub enum HijackError {
    /// The path is not an application bundle directory
    #[error("Not an application bundle: {}", path.display())]
    NotAnApplication { path: PathBuf },

    /// Info.plist lacks CFBundleExecutable
    #[error("No 'CFBundleExecutable' in manifest of {}", path.display())]
    ManifestMissingExecutable { path: PathBuf },

    /// Binary metadata is unreadable or corrupt
    #[error("Failed to parse {}: {message}", path.display())]
    ParseFailure { path: PathBuf, message: String },

    /// An existence check failed with something other than "not found"
    #[error("Existence probe failed for {}: {source}", path.display())]
    FilesystemProbeFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A slice lacks fields the analyzer needs
    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest decoding errors
    #[error("Plist error: {0}")]
    Plist(#[from] plist::Error),
}

impl HijackError {
    pub(crate) fn parse_failure(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        HijackError::ParseFailure {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// True for failures raised while locating the bundle's main executable.
    pub fn is_bundle_error(&self) -> bool {
        matches!(
            self,
            HijackError::NotAnApplication { .. }
                | HijackError::ManifestMissingExecutable { .. }
                | HijackError::Io(_)
                | HijackError::Plist(_)
        )
    }
}

/// Result type alias for scanner operations
pub type Result<T> = std::result::Result<T, HijackError>;

/// A failed scan of one application.
#[derive(Debug, Error)]
#[error("Skipped {}: {error}", application_path.display())]
pub struct ScanError {
    pub application_path: PathBuf,
    #[source]
    pub error: HijackError,
}

/// Convert scanner errors to PyO3 exceptions
#[cfg(feature = "python-ext")]
impl From<HijackError> for pyo3::PyErr {
    fn from(err: HijackError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyException, PyIOError, PyValueError};

        match err {
            HijackError::Io(e) => PyIOError::new_err(e.to_string()),
            HijackError::FilesystemProbeFailure { .. } => PyIOError::new_err(err.to_string()),
            HijackError::NotAnApplication { .. }
            | HijackError::ManifestMissingExecutable { .. } => {
                PyValueError::new_err(err.to_string())
            }
            _ => PyException::new_err(err.to_string()),
        }
    }
}

#[cfg(feature = "python-ext")]
impl From<ScanError> for pyo3::PyErr {
    fn from(err: ScanError) -> pyo3::PyErr {
        err.error.into()
    }
}

//! Existence probes for candidate library paths.
//!
//! "Not found" is an answer; any other I/O failure is an error. Folding
//! transient failures into "absent" would invent findings, and folding
//! them into "present" would hide real ones.

use crate::error::{HijackError, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;

/// Stat-style existence check.
pub trait Filesystem: Send + Sync {
    fn exists(&self, path: &str) -> Result<bool>;
}

/// Probes the real filesystem, following symlinks.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn exists(&self, path: &str) -> Result<bool> {
        match fs::metadata(path) {
            Ok(_) => Ok(true),
            // InvalidInput: interior NUL, which no on-disk path can contain
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::InvalidInput
                ) =>
            {
                Ok(false)
            }
            Err(source) => Err(HijackError::FilesystemProbeFailure {
                path: path.into(),
                source,
            }),
        }
    }
}

/// In-memory filesystem with scripted existence and failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    present: HashSet<String>,
    failing: HashMap<String, ErrorKind>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.present.insert(path.into());
        self
    }

    /// Make probes of `path` fail with `kind`.
    pub fn with_failure(mut self, path: impl Into<String>, kind: ErrorKind) -> Self {
        self.failing.insert(path.into(), kind);
        self
    }
}

impl Filesystem for MemoryFilesystem {
    fn exists(&self, path: &str) -> Result<bool> {
        if let Some(kind) = self.failing.get(path) {
            return Err(HijackError::FilesystemProbeFailure {
                path: path.into(),
                source: (*kind).into(),
            });
        }
        Ok(self.present.contains(path))
    }
}

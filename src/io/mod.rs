//! Bounded, memory-mapped access to executables on disk.
//!
//! Universal binaries can be large; mapping avoids copying every slice
//! while the size cap keeps a hostile bundle from exhausting memory.

pub mod error;

use crate::io::error::{IoError, Result};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Defines the resource limits for I/O operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoLimits {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
}

impl Default for IoLimits {
    fn default() -> Self {
        Self {
            max_file_size: 512 * 1024 * 1024, // 512MB
        }
    }
}

/// A read-only, size-checked mapping of a file.
pub struct MappedFile {
    path: PathBuf,
    // None when the file size is zero; memmap cannot map empty files.
    mmap: Option<Mmap>,
    file_size: u64,
}

impl MappedFile {
    /// Opens a file and memory-maps it.
    ///
    /// This function will fail if the file size exceeds `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: &IoLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Mapping file"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "File is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: read-only map of a regular file; the scanner never writes to it.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the total size of the underlying file in bytes.
    pub fn size(&self) -> u64 {
        self.file_size
    }

    /// The mapped contents; empty for zero-length files.
    pub fn data(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }
}

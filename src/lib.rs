//! Detection of dylib hijacking opportunities in macOS application bundles.
//!
//! An executable is hijackable when its code-signing policy lets the
//! loader accept an unsigned library and one of its load commands resolves
//! to a path an unprivileged user can plant a file at.

pub mod analyzer;
pub mod bundle;
pub mod codesign;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod macho;
pub mod probe;
pub mod protect;
pub mod resolve;
pub mod scan;

#[cfg(feature = "python-ext")]
pub mod python_bindings;

pub use analyzer::{Analyzer, AppFinding, HijackCategory, HijackFinding};
pub use config::ScanConfig;
pub use error::{HijackError, Result, ScanError};
pub use macho::{BinarySliceMetadata, LoadDirective};
pub use scan::{results_to_json, ScanResult, Scanner};

#[cfg(feature = "python-ext")]
use pyo3::prelude::*;

/// A Python module implemented in Rust.
#[cfg(feature = "python-ext")]
#[pymodule]
fn hijackscan(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python_bindings::register_python_bindings(m)
}

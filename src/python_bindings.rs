//! Python bindings for the scanner.
//!
//! Findings cross the boundary as JSON strings; `json.loads` on the
//! Python side gives plain dicts.

use crate::config::ScanConfig;
use crate::scan::{results_to_json, Scanner};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::path::Path;

fn load_config(config_json: Option<String>) -> PyResult<ScanConfig> {
    match config_json {
        Some(json) => ScanConfig::from_json(&json).map_err(json_error),
        None => Ok(ScanConfig::default()),
    }
}

fn json_error(e: serde_json::Error) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Scan one application bundle; raises on failure.
#[pyfunction]
#[pyo3(signature = (path, config_json=None))]
pub fn scan_app(path: String, config_json: Option<String>) -> PyResult<String> {
    let scanner = Scanner::new(load_config(config_json)?);
    let finding = scanner.scan_app(Path::new(&path))?;
    finding.to_json().map_err(json_error)
}

/// Scan several bundles; failures are reported per entry.
#[pyfunction]
#[pyo3(signature = (paths, config_json=None))]
pub fn scan(paths: Vec<String>, config_json: Option<String>) -> PyResult<String> {
    let scanner = Scanner::new(load_config(config_json)?);
    results_to_json(&scanner.scan(&paths)).map_err(json_error)
}

/// Scan every bundle in the configured applications directory.
#[pyfunction]
#[pyo3(signature = (config_json=None))]
pub fn scan_installed(config_json: Option<String>) -> PyResult<String> {
    let scanner = Scanner::new(load_config(config_json)?);
    results_to_json(&scanner.scan_installed()?).map_err(json_error)
}

/// Register all Python bindings with the module.
pub fn register_python_bindings(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(scan_app, m)?)?;
    m.add_function(wrap_pyfunction!(scan, m)?)?;
    m.add_function(wrap_pyfunction!(scan_installed, m)?)?;
    m.add_function(wrap_pyfunction!(crate::logging::init_logging, m)?)?;
    Ok(())
}

//! Configuration for the scanner.
//!
//! Lookup tables (protected prefixes, token literals) are explicit here
//! rather than global so they can be overridden per OS release and pinned
//! in tests.

use crate::io::IoLimits;
use crate::protect::ProtectedPaths;
use crate::resolve::SymbolicTokens;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Master configuration for a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory trees never reported as hijack targets.
    pub protected: ProtectedPaths,
    /// Load-path token literals.
    pub tokens: SymbolicTokens,
    /// Limits on reading executables.
    pub io: IoLimits,
    /// Analyze applications on the rayon pool.
    pub parallel: bool,
    /// Where `scan_installed` looks for bundles (default: /Applications).
    pub applications_dir: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            protected: ProtectedPaths::default(),
            tokens: SymbolicTokens::default(),
            io: IoLimits::default(),
            parallel: true,
            applications_dir: PathBuf::from("/Applications"),
        }
    }
}

impl ScanConfig {
    /// Load a configuration from JSON; absent fields keep their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

//! Dylib hijack analysis of one executable.
//!
//! A slice is only worth examining when the loader would accept an
//! unsigned library ([`codesign::is_injectable`]). For such slices every
//! dylib load command is classified:
//!
//! - **weak**: optional loads; each candidate that is missing and not in
//!   a protected tree is a plant point
//! - **rpath**: `@rpath` loads; candidates searched before the first one
//!   that exists are plant points, since the linker stops at a hit
//! - **proxy**: all other loads; the bound path can be replaced whether
//!   or not it exists today

use crate::codesign::{self, CodeSignFlags};
use crate::config::ScanConfig;
use crate::error::{HijackError, Result};
use crate::macho::BinarySliceMetadata;
use crate::probe::Filesystem;
use crate::protect::ProtectedPaths;
use crate::resolve::{candidate_paths, expand_search_paths, resolve_proxy_path, SymbolicTokens};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Why a load path is hijackable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HijackCategory {
    Weak,
    RPath,
    Proxy,
}

impl fmt::Display for HijackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HijackCategory::Weak => write!(f, "weak"),
            HijackCategory::RPath => write!(f, "rpath"),
            HijackCategory::Proxy => write!(f, "proxy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HijackFinding {
    pub category: HijackCategory,
    pub path: String,
}

impl HijackFinding {
    pub fn new(category: HijackCategory, path: impl Into<String>) -> Self {
        Self {
            category,
            path: path.into(),
        }
    }
}

/// Analysis result for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppFinding {
    pub application_path: PathBuf,
    pub executable_path: PathBuf,
    /// Flags of the first slice, e.g. `0x10000`
    pub code_sign_flags_hex: String,
    /// Named bits of the first slice's flags
    pub code_sign_flag_names: Vec<String>,
    pub library_validation_disabled: bool,
    pub allow_dyld_environment_variables: bool,
    /// True if any slice accepts unsigned libraries
    pub injectable: bool,
    /// Findings in slice, then load-command, then search order
    pub hijackable_loads: Vec<HijackFinding>,
}

impl AppFinding {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Directory containing the executable, as used for token expansion.
pub fn executable_dir(executable_path: &Path) -> String {
    match executable_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    }
}

/// Classifies load commands of executables into hijack findings.
#[derive(Debug, Clone)]
pub struct Analyzer<F> {
    protected: ProtectedPaths,
    tokens: SymbolicTokens,
    fs: F,
}

impl<F: Filesystem> Analyzer<F> {
    pub fn new(fs: F) -> Self {
        Self::with_config(&ScanConfig::default(), fs)
    }

    pub fn with_config(config: &ScanConfig, fs: F) -> Self {
        Self {
            protected: config.protected.clone(),
            tokens: config.tokens.clone(),
            fs,
        }
    }

    pub fn protected(&self) -> &ProtectedPaths {
        &self.protected
    }

    /// Analyze every slice of an executable.
    ///
    /// Slice 0 supplies the reported signing state even when no slice is
    /// injectable.
    pub fn analyze(
        &self,
        application_path: &Path,
        executable_path: &Path,
        slices: &[BinarySliceMetadata],
    ) -> Result<AppFinding> {
        let first = slices.first().ok_or_else(|| {
            HijackError::MetadataUnavailable(format!(
                "no architecture slices in {}",
                executable_path.display()
            ))
        })?;

        let mut finding = AppFinding {
            application_path: application_path.to_path_buf(),
            executable_path: executable_path.to_path_buf(),
            code_sign_flags_hex: format!("{:#x}", first.code_sign_flags),
            code_sign_flag_names: CodeSignFlags::from_bits_retain(first.code_sign_flags)
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            library_validation_disabled: first.library_validation_disabled,
            allow_dyld_environment_variables: first.allow_dyld_environment_variables,
            injectable: false,
            hijackable_loads: Vec::new(),
        };

        let dir = executable_dir(executable_path);
        for (index, slice) in slices.iter().enumerate() {
            if let Some(found) = self.analyze_slice(slice, &dir)? {
                debug!(
                    slice = index,
                    arch = slice.arch_name(),
                    findings = found.len(),
                    "Slice is injectable"
                );
                finding.injectable = true;
                finding.hijackable_loads.extend(found);
            }
        }
        Ok(finding)
    }

    /// Findings for one slice, or `None` if library validation protects it.
    pub fn analyze_slice(
        &self,
        slice: &BinarySliceMetadata,
        executable_dir: &str,
    ) -> Result<Option<Vec<HijackFinding>>> {
        let rpaths = expand_search_paths(&slice.runtime_search_paths, executable_dir, &self.tokens);

        let flags = slice.code_sign_flags;
        if !codesign::is_injectable(flags, slice.library_validation_disabled) {
            debug!(
                arch = slice.arch_name(),
                flags = %format!("{flags:#x}"),
                hardened = codesign::is_hardened_runtime(flags),
                require_lv = codesign::requires_library_validation(flags),
                "Library validation enforced, skipping slice"
            );
            return Ok(None);
        }

        let mut findings = self.weak_findings(slice, executable_dir, &rpaths)?;
        for load in &slice.library_loads {
            if self.tokens.is_rpath_relative(&load.name) {
                findings.extend(self.rpath_findings(&load.name, executable_dir, &rpaths)?);
            } else if let Some(proxy) = self.proxy_finding(&load.name, executable_dir) {
                findings.push(proxy);
            }
        }
        Ok(Some(findings))
    }

    fn weak_findings(
        &self,
        slice: &BinarySliceMetadata,
        executable_dir: &str,
        rpaths: &[String],
    ) -> Result<Vec<HijackFinding>> {
        let mut findings = Vec::new();
        for load in &slice.weak_library_loads {
            let candidates = if load.name.starts_with('/') {
                vec![load.name.clone()]
            } else if load.name.starts_with('@') {
                candidate_paths(&load.name, executable_dir, rpaths, &self.tokens)
            } else {
                trace!(load = %load.name, "Relative weak load, not resolvable");
                Vec::new()
            };

            for candidate in candidates {
                if self.protected.is_protected(&candidate) || self.fs.exists(&candidate)? {
                    trace!(path = %candidate, "Weak candidate protected or present");
                    continue;
                }
                findings.push(HijackFinding::new(HijackCategory::Weak, candidate));
            }
        }
        Ok(findings)
    }

    fn rpath_findings(
        &self,
        name: &str,
        executable_dir: &str,
        rpaths: &[String],
    ) -> Result<Vec<HijackFinding>> {
        let candidates = candidate_paths(name, executable_dir, rpaths, &self.tokens);

        // Index of the first candidate the linker would actually load
        let mut boundary = candidates.len();
        for (i, candidate) in candidates.iter().enumerate() {
            if self.fs.exists(candidate)? {
                boundary = i;
                break;
            }
        }
        trace!(
            load = name,
            candidates = candidates.len(),
            boundary,
            "Resolved @rpath load"
        );

        Ok(candidates
            .into_iter()
            .take(boundary)
            .filter(|candidate| !self.protected.is_protected(candidate))
            .map(|candidate| HijackFinding::new(HijackCategory::RPath, candidate))
            .collect())
    }

    fn proxy_finding(&self, name: &str, executable_dir: &str) -> Option<HijackFinding> {
        let path = resolve_proxy_path(name, executable_dir, &self.tokens);
        if self.protected.is_protected(&path) {
            None
        } else {
            Some(HijackFinding::new(HijackCategory::Proxy, path))
        }
    }
}

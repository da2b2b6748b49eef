//! Scan driver: bundle → executable → slices → findings.
//!
//! Applications are independent, so a sweep may run them on the rayon
//! pool. Results always come back in input order, and one application's
//! failure never aborts the others.

use crate::analyzer::{Analyzer, AppFinding};
use crate::bundle::{discover_applications, BundleResolver, InfoPlistBundleResolver};
use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::macho::{MachOParser, ObjectMachOParser};
use crate::probe::{Filesystem, OsFilesystem};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{info, info_span, warn};

pub type ScanResult = std::result::Result<AppFinding, ScanError>;

/// JSON view of one scan result.
#[derive(Serialize)]
#[serde(untagged)]
enum ScanEntry<'a> {
    Finding {
        application_path: &'a Path,
        finding: &'a AppFinding,
    },
    Failure {
        application_path: &'a Path,
        error: String,
    },
}

impl<'a> From<&'a ScanResult> for ScanEntry<'a> {
    fn from(result: &'a ScanResult) -> Self {
        match result {
            Ok(finding) => ScanEntry::Finding {
                application_path: &finding.application_path,
                finding,
            },
            Err(err) => ScanEntry::Failure {
                application_path: &err.application_path,
                error: err.error.to_string(),
            },
        }
    }
}

/// Render a batch of results as a JSON array, one entry per application.
///
/// Paths that are not valid UTF-8 make this fail rather than be mangled.
pub fn results_to_json(results: &[ScanResult]) -> serde_json::Result<String> {
    let entries: Vec<ScanEntry<'_>> = results.iter().map(ScanEntry::from).collect();
    serde_json::to_string_pretty(&entries)
}

pub struct Scanner<B = InfoPlistBundleResolver, P = ObjectMachOParser, F = OsFilesystem> {
    config: ScanConfig,
    bundles: B,
    parser: P,
    analyzer: Analyzer<F>,
}

impl Scanner {
    /// Scanner over the real filesystem.
    pub fn new(config: ScanConfig) -> Self {
        let parser = ObjectMachOParser::new(config.io.clone());
        Self::with_collaborators(config, InfoPlistBundleResolver, parser, OsFilesystem)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

impl<B, P, F> Scanner<B, P, F>
where
    B: BundleResolver,
    P: MachOParser,
    F: Filesystem,
{
    pub fn with_collaborators(config: ScanConfig, bundles: B, parser: P, fs: F) -> Self {
        let analyzer = Analyzer::with_config(&config, fs);
        Self {
            config,
            bundles,
            parser,
            analyzer,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Analyze a single application bundle.
    pub fn scan_app(&self, application_path: &Path) -> Result<AppFinding> {
        let span = info_span!("scan_app", app = %application_path.display());
        let _guard = span.enter();

        let executable = self.bundles.main_executable_path(application_path)?;
        let slices = self.parser.parse(&executable)?;
        let finding = self.analyzer.analyze(application_path, &executable, &slices)?;

        info!(
            slices = slices.len(),
            flags = %finding.code_sign_flags_hex,
            injectable = finding.injectable,
            findings = finding.hijackable_loads.len(),
            "Application scanned"
        );
        Ok(finding)
    }

    fn scan_one(&self, application_path: &Path) -> ScanResult {
        self.scan_app(application_path).map_err(|error| {
            warn!(app = %application_path.display(), error = %error, "Skipping application");
            ScanError {
                application_path: application_path.to_path_buf(),
                error,
            }
        })
    }

    /// One result per application, in input order.
    pub fn scan<A>(&self, application_paths: &[A]) -> Vec<ScanResult>
    where
        A: AsRef<Path> + Sync,
    {
        if self.config.parallel {
            application_paths
                .par_iter()
                .map(|app| self.scan_one(app.as_ref()))
                .collect()
        } else {
            application_paths
                .iter()
                .map(|app| self.scan_one(app.as_ref()))
                .collect()
        }
    }

    /// Scan every `*.app` bundle directly under `dir`.
    pub fn scan_directory(&self, dir: &Path) -> Result<Vec<ScanResult>> {
        let apps = discover_applications(dir)?;
        info!(dir = %dir.display(), applications = apps.len(), "Discovered applications");
        Ok(self.scan(&apps))
    }

    /// Scan the configured applications directory.
    pub fn scan_installed(&self) -> Result<Vec<ScanResult>> {
        self.scan_directory(&self.config.applications_dir)
    }
}

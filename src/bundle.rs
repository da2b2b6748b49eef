//! Application bundle lookup.
//!
//! A macOS `.app` names its main executable in `Contents/Info.plist`
//! (`CFBundleExecutable`); the binary lives in `Contents/MacOS/`.

use crate::error::{HijackError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Locates the principal executable of a bundle.
pub trait BundleResolver: Send + Sync {
    fn main_executable_path(&self, bundle_path: &Path) -> Result<PathBuf>;
}

#[derive(Debug, Deserialize)]
struct InfoPlist {
    #[serde(rename = "CFBundleExecutable", default)]
    bundle_executable: Option<String>,
}

/// Reads `Contents/Info.plist` from a bundle directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfoPlistBundleResolver;

impl InfoPlistBundleResolver {
    pub fn info_plist_path(bundle_path: &Path) -> PathBuf {
        bundle_path.join("Contents").join("Info.plist")
    }
}

impl BundleResolver for InfoPlistBundleResolver {
    fn main_executable_path(&self, bundle_path: &Path) -> Result<PathBuf> {
        if !fs::metadata(bundle_path)?.is_dir() {
            return Err(HijackError::NotAnApplication {
                path: bundle_path.to_path_buf(),
            });
        }

        let manifest = Self::info_plist_path(bundle_path);
        trace!(manifest = %manifest.display(), "Reading bundle manifest");
        let data = fs::read(&manifest)?;
        let info: InfoPlist = plist::from_bytes(&data)?;

        let executable = info
            .bundle_executable
            .filter(|name| !name.is_empty())
            .ok_or_else(|| HijackError::ManifestMissingExecutable {
                path: bundle_path.to_path_buf(),
            })?;

        let path = bundle_path.join("Contents").join("MacOS").join(executable);
        debug!(
            bundle = %bundle_path.display(),
            executable = %path.display(),
            "Resolved main executable"
        );
        Ok(path)
    }
}

/// Bundles directly under `dir`: directories named `*.app`, sorted by name.
pub fn discover_applications(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut apps = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_app = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(".app"));
        if is_app && entry.file_type()?.is_dir() {
            apps.push(entry.path());
        }
    }
    apps.sort();
    Ok(apps)
}

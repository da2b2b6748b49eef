//! Classification of OS-protected directory trees.
//!
//! Paths under System Integrity Protection are not writable by an
//! unprivileged attacker. Querying SIP status precisely needs privileged,
//! OS-specific calls, so this is a prefix allow-list instead.

use serde::{Deserialize, Serialize};

/// Prefixes of directory trees treated as unwritable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtectedPaths {
    prefixes: Vec<String>,
}

impl Default for ProtectedPaths {
    fn default() -> Self {
        Self::new(["/System/", "/usr/"])
    }
}

impl ProtectedPaths {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// True if `path` falls under one of the protected prefixes.
    pub fn is_protected(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

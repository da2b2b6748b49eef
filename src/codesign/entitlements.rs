//! Entitlements relevant to library loading.

use plist::Dictionary;
use serde::Serialize;
use tracing::{debug, warn};

pub const DISABLE_LIBRARY_VALIDATION: &str = "com.apple.security.cs.disable-library-validation";
pub const ALLOW_DYLD_ENVIRONMENT_VARIABLES: &str =
    "com.apple.security.cs.allow-dyld-environment-variables";

/// Entitlement keys read from the embedded XML entitlements plist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Entitlements {
    /// `com.apple.security.cs.disable-library-validation`
    pub disable_library_validation: bool,

    /// `com.apple.security.cs.allow-dyld-environment-variables`
    pub allow_dyld_environment_variables: bool,
}

/// A key is granted only when it holds a boolean `true`.
fn granted(dict: &Dictionary, key: &str) -> bool {
    match dict.get(key) {
        Some(value) => value.as_boolean().unwrap_or_else(|| {
            debug!(key, "Ignoring non-boolean entitlement");
            false
        }),
        None => false,
    }
}

impl Entitlements {
    /// Decode an entitlements plist (XML or binary).
    ///
    /// Keys are read independently, so a malformed value under one key
    /// never hides another.
    pub fn from_plist(data: &[u8]) -> Result<Self, plist::Error> {
        let dict: Dictionary = plist::from_bytes(data)?;
        Ok(Self::from_dictionary(&dict))
    }

    pub fn from_dictionary(dict: &Dictionary) -> Self {
        Self {
            disable_library_validation: granted(dict, DISABLE_LIBRARY_VALIDATION),
            allow_dyld_environment_variables: granted(dict, ALLOW_DYLD_ENVIRONMENT_VARIABLES),
        }
    }

    /// Decode an entitlements plist, treating malformed data as empty.
    pub fn from_plist_lenient(data: &[u8]) -> Self {
        Self::from_plist(data).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring malformed entitlements plist");
            Self::default()
        })
    }
}

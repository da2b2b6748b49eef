//! Per-architecture metadata extracted from a Mach-O image.

use object::macho;
use serde::{Deserialize, Serialize};

/// A dylib load command (`LC_LOAD_DYLIB` / `LC_LOAD_WEAK_DYLIB`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadDirective {
    /// Install name, possibly starting with a symbolic token
    pub name: String,
    pub timestamp: u32,
    pub current_version: String,
    pub compatibility_version: String,
}

impl LoadDirective {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Render a packed `xxxx.yy.zz` dylib version.
pub fn format_version(packed: u32) -> String {
    format!("{}.{}.{}", packed >> 16, (packed >> 8) & 0xff, packed & 0xff)
}

/// Metadata for one architecture slice of an executable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BinarySliceMetadata {
    pub cpu_type: u32,
    pub cpu_subtype: u32,
    /// CodeDirectory flags; 0 for unsigned binaries
    pub code_sign_flags: u32,
    pub library_validation_disabled: bool,
    pub allow_dyld_environment_variables: bool,
    /// `LC_LOAD_DYLINKER` path
    pub dylinker: Option<String>,
    /// Raw `LC_RPATH` entries in load-command order
    pub runtime_search_paths: Vec<String>,
    pub library_loads: Vec<LoadDirective>,
    pub weak_library_loads: Vec<LoadDirective>,
}

impl BinarySliceMetadata {
    /// Conventional architecture name for the slice.
    pub fn arch_name(&self) -> &'static str {
        match self.cpu_type {
            macho::CPU_TYPE_X86_64 => "x86_64",
            macho::CPU_TYPE_X86 => "i386",
            macho::CPU_TYPE_ARM64 => {
                if self.cpu_subtype & !macho::CPU_SUBTYPE_MASK == macho::CPU_SUBTYPE_ARM64E {
                    "arm64e"
                } else {
                    "arm64"
                }
            }
            macho::CPU_TYPE_ARM64_32 => "arm64_32",
            macho::CPU_TYPE_ARM => "arm",
            macho::CPU_TYPE_POWERPC => "ppc",
            macho::CPU_TYPE_POWERPC64 => "ppc64",
            _ => "unknown",
        }
    }
}

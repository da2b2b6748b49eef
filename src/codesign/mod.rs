//! Code-signing policy evaluation.
//!
//! The predicates operate on the raw 32-bit flag word from the
//! CodeDirectory header. Bit positions are the platform's `CS_*` values.
//!
//! - [`superblob`] locates the CodeDirectory and entitlements inside an
//!   embedded signature
//! - [`entitlements`] reads the library-validation entitlements

pub mod entitlements;
pub mod superblob;

pub use entitlements::Entitlements;
pub use superblob::{parse_embedded_signature, EmbeddedSignature};

/// `CS_REQUIRE_LV`: library validation is mandatory.
pub const REQUIRE_LV: u32 = 0x2000;

/// `CS_RUNTIME`: hardened runtime, which implies library validation.
pub const RUNTIME: u32 = 0x10000;

bitflags::bitflags! {
    /// Named view of the code-signing flag word, for reporting.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CodeSignFlags: u32 {
        const VALID = 0x0000_0001;
        const ADHOC = 0x0000_0002;
        const GET_TASK_ALLOW = 0x0000_0004;
        const INSTALLER = 0x0000_0008;
        const FORCED_LV = 0x0000_0010;
        const INVALID_ALLOWED = 0x0000_0020;
        const HARD = 0x0000_0100;
        const KILL = 0x0000_0200;
        const CHECK_EXPIRATION = 0x0000_0400;
        const RESTRICT = 0x0000_0800;
        const ENFORCEMENT = 0x0000_1000;
        const REQUIRE_LV = REQUIRE_LV;
        const RUNTIME = RUNTIME;
        const LINKER_SIGNED = 0x0002_0000;

        // Unnamed bits are kept, not truncated
        const _ = !0;
    }
}

impl CodeSignFlags {
    /// Names of the well-known bits that are set, lowest bit first.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

/// True if the hardened runtime bit is set.
pub fn is_hardened_runtime(flags: u32) -> bool {
    flags & RUNTIME != 0
}

/// True if mandatory library validation is set.
pub fn requires_library_validation(flags: u32) -> bool {
    flags & REQUIRE_LV != 0
}

/// True if an unsigned library planted on a load path would be accepted.
///
/// Library validation blocks planted libraries unless the binary carries
/// the entitlement that switches it off.
pub fn is_injectable(flags: u32, library_validation_disabled: bool) -> bool {
    !((is_hardened_runtime(flags) || requires_library_validation(flags))
        && !library_validation_disabled)
}

//! Embedded code-signature (SuperBlob) reader.
//!
//! Layout, all fields big-endian:
//!
//! ```text
//! SuperBlob   magic 0xfade0cc0 | length | count | count × (slot type, offset)
//! CodeDir     magic 0xfade0c02 | length | version | flags | ...
//! Entitlements magic 0xfade7171 | length | XML plist bytes
//! ```
//!
//! Offsets in the index are relative to the start of the SuperBlob.

use thiserror::Error;
use tracing::warn;

pub const CSMAGIC_EMBEDDED_SIGNATURE: u32 = 0xfade0cc0;
pub const CSMAGIC_CODEDIRECTORY: u32 = 0xfade0c02;
pub const CSMAGIC_EMBEDDED_ENTITLEMENTS: u32 = 0xfade7171;

pub const CSSLOT_CODEDIRECTORY: u32 = 0x0000;
pub const CSSLOT_ENTITLEMENTS: u32 = 0x0005;
pub const CSSLOT_ALTERNATE_CODEDIRECTORIES: u32 = 0x1000;
pub const CSSLOT_ALTERNATE_CODEDIRECTORY_MAX: u32 = 5;

const SUPERBLOB_HEADER_SIZE: usize = 12;
const BLOB_INDEX_SIZE: usize = 8;
const BLOB_HEADER_SIZE: usize = 8;
const CODEDIRECTORY_FLAGS_OFFSET: usize = 12;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("bad SuperBlob magic {found:#010x}")]
    BadMagic { found: u32 },

    #[error("signature truncated: {what} at offset {offset}")]
    Truncated { what: &'static str, offset: usize },
}

/// The parts of an embedded signature the policy evaluator needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedSignature {
    /// CodeDirectory flags; `None` when no CodeDirectory is present
    pub flags: Option<u32>,
    /// Raw XML entitlements plist
    pub entitlements: Option<Vec<u8>>,
}

fn read_be_u32(data: &[u8], off: usize) -> Option<u32> {
    let b = data.get(off..off.checked_add(4)?)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Payload of an entitlements blob, or `None` if its length is out of range.
fn entitlements_payload(blob: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    if len < BLOB_HEADER_SIZE {
        return None;
    }
    blob.get(offset + BLOB_HEADER_SIZE..offset.checked_add(len)?)
}

fn is_code_directory_slot(slot: u32) -> bool {
    slot == CSSLOT_CODEDIRECTORY
        || (CSSLOT_ALTERNATE_CODEDIRECTORIES
            ..CSSLOT_ALTERNATE_CODEDIRECTORIES + CSSLOT_ALTERNATE_CODEDIRECTORY_MAX)
            .contains(&slot)
}

/// Parse the SuperBlob referenced by `LC_CODE_SIGNATURE`.
///
/// The primary CodeDirectory (slot 0) is authoritative for flags; an
/// alternate CodeDirectory is used only when slot 0 is absent.
pub fn parse_embedded_signature(data: &[u8]) -> Result<EmbeddedSignature, SignatureError> {
    let truncated = |what, offset| SignatureError::Truncated { what, offset };

    let magic = read_be_u32(data, 0).ok_or(truncated("SuperBlob header", 0))?;
    if magic != CSMAGIC_EMBEDDED_SIGNATURE {
        return Err(SignatureError::BadMagic { found: magic });
    }
    let length = read_be_u32(data, 4).ok_or(truncated("SuperBlob header", 4))? as usize;
    let count = read_be_u32(data, 8).ok_or(truncated("SuperBlob header", 8))? as usize;
    let blob = &data[..length.min(data.len())];

    let mut signature = EmbeddedSignature::default();
    let mut primary_seen = false;

    for i in 0..count {
        let entry = SUPERBLOB_HEADER_SIZE + i * BLOB_INDEX_SIZE;
        let slot = read_be_u32(blob, entry).ok_or(truncated("blob index", entry))?;
        let offset =
            read_be_u32(blob, entry + 4).ok_or(truncated("blob index", entry + 4))? as usize;

        if is_code_directory_slot(slot) {
            if primary_seen || (signature.flags.is_some() && slot != CSSLOT_CODEDIRECTORY) {
                continue;
            }
            let magic = read_be_u32(blob, offset).ok_or(truncated("CodeDirectory", offset))?;
            if magic != CSMAGIC_CODEDIRECTORY {
                continue;
            }
            let flags = read_be_u32(blob, offset + CODEDIRECTORY_FLAGS_OFFSET)
                .ok_or(truncated("CodeDirectory flags", offset))?;
            signature.flags = Some(flags);
            primary_seen = slot == CSSLOT_CODEDIRECTORY;
        } else if slot == CSSLOT_ENTITLEMENTS {
            let magic = read_be_u32(blob, offset).ok_or(truncated("entitlements", offset))?;
            if magic != CSMAGIC_EMBEDDED_ENTITLEMENTS {
                warn!(offset, magic = %format!("{magic:#010x}"), "Ignoring entitlements slot");
                continue;
            }
            let len = read_be_u32(blob, offset + 4).ok_or(truncated("entitlements", offset))?;
            match entitlements_payload(blob, offset, len as usize) {
                Some(payload) => signature.entitlements = Some(payload.to_vec()),
                None => warn!(offset, len, "Ignoring entitlements blob with bad length"),
            }
        }
    }

    Ok(signature)
}

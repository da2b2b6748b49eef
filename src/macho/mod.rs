//! Mach-O metadata extraction for hijack analysis.
//!
//! Thin images yield one [`BinarySliceMetadata`]; universal (fat) images
//! yield one per architecture, in fat-header order.

pub mod types;

pub use types::{format_version, BinarySliceMetadata, LoadDirective};

use crate::codesign::{parse_embedded_signature, superblob::SignatureError, Entitlements};
use crate::error::{HijackError, Result};
use crate::io::{IoLimits, MappedFile};
use object::macho;
use object::read::macho::{FatArch, LoadCommandVariant, MachHeader, MachOFatFile32, MachOFatFile64};
use object::{Endianness, FileKind};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum MachOError {
    #[error("{0}")]
    Object(#[from] object::read::Error),

    #[error("code signature: {0}")]
    Signature(#[from] SignatureError),

    #[error("unsupported binary format: {0}")]
    UnsupportedFormat(String),

    #[error("{0} extends past end of image")]
    Truncated(&'static str),
}

/// Source of per-architecture metadata for an executable.
pub trait MachOParser: Send + Sync {
    fn parse(&self, executable_path: &Path) -> Result<Vec<BinarySliceMetadata>>;
}

/// Parses executables from disk with the `object` crate.
#[derive(Debug, Clone, Default)]
pub struct ObjectMachOParser {
    limits: IoLimits,
}

impl ObjectMachOParser {
    pub fn new(limits: IoLimits) -> Self {
        Self { limits }
    }
}

impl MachOParser for ObjectMachOParser {
    fn parse(&self, executable_path: &Path) -> Result<Vec<BinarySliceMetadata>> {
        let mapped = MappedFile::open(executable_path, &self.limits)
            .map_err(|e| HijackError::parse_failure(executable_path, e))?;
        let slices = parse_slices(mapped.data())
            .map_err(|e| HijackError::parse_failure(executable_path, e))?;
        debug!(
            path = %executable_path.display(),
            slices = slices.len(),
            "Parsed Mach-O"
        );
        Ok(slices)
    }
}

/// Extract slice metadata from a thin or universal Mach-O image.
pub fn parse_slices(data: &[u8]) -> std::result::Result<Vec<BinarySliceMetadata>, MachOError> {
    match FileKind::parse(data)? {
        FileKind::MachOFat32 => parse_fat(MachOFatFile32::parse(data)?.arches(), data),
        FileKind::MachOFat64 => parse_fat(MachOFatFile64::parse(data)?.arches(), data),
        _ => Ok(vec![parse_thin(data)?]),
    }
}

fn parse_fat<A: FatArch>(
    arches: &[A],
    data: &[u8],
) -> std::result::Result<Vec<BinarySliceMetadata>, MachOError> {
    arches
        .iter()
        .map(|arch| parse_thin(arch.data(data)?))
        .collect()
}

fn parse_thin(data: &[u8]) -> std::result::Result<BinarySliceMetadata, MachOError> {
    match FileKind::parse(data)? {
        FileKind::MachO32 => parse_image::<macho::MachHeader32<Endianness>>(data),
        FileKind::MachO64 => parse_image::<macho::MachHeader64<Endianness>>(data),
        other => Err(MachOError::UnsupportedFormat(format!("{other:?}"))),
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn parse_image<Mach: MachHeader<Endian = Endianness>>(
    data: &[u8],
) -> std::result::Result<BinarySliceMetadata, MachOError> {
    let header = Mach::parse(data, 0)?;
    let endian = header.endian()?;
    let mut slice = BinarySliceMetadata {
        cpu_type: header.cputype(endian),
        cpu_subtype: header.cpusubtype(endian),
        ..BinarySliceMetadata::default()
    };
    let mut signature_range: Option<(usize, usize)> = None;

    let mut commands = header.load_commands(endian, data, 0)?;
    while let Some(command) = commands.next()? {
        match command.variant()? {
            LoadCommandVariant::Dylib(dylib) => {
                let directive = LoadDirective {
                    name: lossy(command.string(endian, dylib.dylib.name)?),
                    timestamp: dylib.dylib.timestamp.get(endian),
                    current_version: format_version(dylib.dylib.current_version.get(endian)),
                    compatibility_version: format_version(
                        dylib.dylib.compatibility_version.get(endian),
                    ),
                };
                match command.cmd() {
                    macho::LC_LOAD_DYLIB => slice.library_loads.push(directive),
                    macho::LC_LOAD_WEAK_DYLIB => slice.weak_library_loads.push(directive),
                    _ => {}
                }
            }
            LoadCommandVariant::Rpath(rpath) => {
                slice
                    .runtime_search_paths
                    .push(lossy(command.string(endian, rpath.path)?));
            }
            LoadCommandVariant::LoadDylinker(dylinker) => {
                slice.dylinker = Some(lossy(command.string(endian, dylinker.name)?));
            }
            LoadCommandVariant::LinkeditData(linkedit)
                if command.cmd() == macho::LC_CODE_SIGNATURE =>
            {
                signature_range = Some((
                    linkedit.dataoff.get(endian) as usize,
                    linkedit.datasize.get(endian) as usize,
                ));
            }
            _ => {}
        }
    }

    if let Some((offset, size)) = signature_range {
        let blob = data
            .get(offset..offset.saturating_add(size))
            .ok_or(MachOError::Truncated("LC_CODE_SIGNATURE data"))?;
        let signature = parse_embedded_signature(blob)?;
        slice.code_sign_flags = signature.flags.unwrap_or(0);
        if let Some(plist) = signature.entitlements {
            let entitlements = Entitlements::from_plist_lenient(&plist);
            slice.library_validation_disabled = entitlements.disable_library_validation;
            slice.allow_dyld_environment_variables = entitlements.allow_dyld_environment_variables;
        }
    }

    Ok(slice)
}

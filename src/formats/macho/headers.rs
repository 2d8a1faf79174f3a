//! Mach header parsing

use crate::formats::macho::types::*;
use crate::formats::macho::utils::EndianRead;

/// Outer shape of a Mach-O file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// A single-architecture image
    Thin,
    /// A universal wrapper, `is_64` for `fat_arch_64` tables
    Fat { is_64: bool },
}

/// Classify a file by its leading magic
pub fn detect(data: &[u8]) -> Result<ContainerKind> {
    let magic = data.read_u32(0, Endianness::Big)?;
    match magic {
        FAT_MAGIC | FAT_MAGIC_64 => {
            let nfat_arch = data.read_u32(4, Endianness::Big)?;
            if nfat_arch > MAX_FAT_ARCHES {
                return Err(MachOError::InvalidMagic);
            }
            Ok(ContainerKind::Fat {
                is_64: magic == FAT_MAGIC_64,
            })
        }
        MH_MAGIC | MH_CIGAM | MH_MAGIC_64 | MH_CIGAM_64 => Ok(ContainerKind::Thin),
        _ => Err(MachOError::InvalidMagic),
    }
}

/// Parse the Mach header at the start of `data`
pub fn parse_header(data: &[u8]) -> Result<MachHeader> {
    // Read as big-endian; a little-endian image then shows the swapped magic.
    let magic = data.read_u32(0, Endianness::Big)?;
    let (class, endian) = match magic {
        MH_MAGIC => (MachOClass::MachO32, Endianness::Big),
        MH_MAGIC_64 => (MachOClass::MachO64, Endianness::Big),
        MH_CIGAM => (MachOClass::MachO32, Endianness::Little),
        MH_CIGAM_64 => (MachOClass::MachO64, Endianness::Little),
        _ => return Err(MachOError::InvalidMagic),
    };

    let header_size = class.header_size();
    if data.len() < header_size {
        return Err(MachOError::Truncated {
            offset: 0,
            needed: header_size,
        });
    }

    Ok(MachHeader {
        magic: data.read_u32(0, endian)?,
        class,
        endian,
        cputype: data.read_i32(4, endian)?,
        cpusubtype: data.read_i32(8, endian)?,
        filetype: data.read_u32(12, endian)?,
        ncmds: data.read_u32(16, endian)?,
        sizeofcmds: data.read_u32(20, endian)?,
        flags: data.read_u32(24, endian)?,
    })
}

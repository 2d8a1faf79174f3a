//! Universal (fat) binary arch tables

use crate::formats::macho::types::*;
use crate::formats::macho::utils::{check_range, EndianRead};
use tracing::debug;

/// Parse the arch table of a fat binary. Fat headers are always big-endian.
pub fn parse_fat_arches(data: &[u8], is_64: bool) -> Result<Vec<FatArch>> {
    let be = Endianness::Big;
    let nfat_arch = data.read_u32(4, be)?;
    if nfat_arch == 0 {
        return Err(MachOError::EmptyFatBinary);
    }

    let entry_size = if is_64 { FAT_ARCH_64_SIZE } else { FAT_ARCH_SIZE };
    let mut arches = Vec::with_capacity(nfat_arch as usize);
    for i in 0..nfat_arch {
        let off = FAT_HEADER_SIZE + i as usize * entry_size;
        let arch = if is_64 {
            FatArch {
                cputype: data.read_i32(off, be)?,
                cpusubtype: data.read_i32(off + 4, be)?,
                offset: data.read_u64(off + 8, be)?,
                size: data.read_u64(off + 16, be)?,
                align: data.read_u32(off + 24, be)?,
            }
        } else {
            FatArch {
                cputype: data.read_i32(off, be)?,
                cpusubtype: data.read_i32(off + 4, be)?,
                offset: data.read_u32(off + 8, be)? as u64,
                size: data.read_u32(off + 12, be)? as u64,
                align: data.read_u32(off + 16, be)?,
            }
        };

        if !check_range(arch.offset, arch.size, data.len() as u64) {
            return Err(MachOError::SliceOutOfRange {
                index: i,
                offset: arch.offset,
                size: arch.size,
            });
        }
        arches.push(arch);
    }

    Ok(arches)
}

/// Pick the slice to parse.
///
/// With an explicit `wanted` CPU the slice must exist. Without one the host
/// CPU is preferred and the first slice is the fallback.
pub fn select_slice(arches: &[FatArch], wanted: Option<CpuType>) -> Result<FatArch> {
    if let Some(cpu) = wanted {
        return arches
            .iter()
            .find(|a| a.cpu() == cpu)
            .copied()
            .ok_or(MachOError::NoMatchingSlice(cpu));
    }

    let host = CpuType::host();
    let chosen = host
        .and_then(|cpu| arches.iter().find(|a| a.cpu() == cpu))
        .or_else(|| arches.first())
        .copied()
        .ok_or(MachOError::EmptyFatBinary)?;

    debug!(
        cpu = %chosen.cpu(),
        offset = chosen.offset,
        size = chosen.size,
        slices = arches.len(),
        "Selected fat slice"
    );
    Ok(chosen)
}

//! Load command table walking and segment/section extraction

use crate::formats::macho::types::*;
use crate::formats::macho::utils::{check_range, decode_name, EndianRead};
use crate::image::{Section, Segment};
use tracing::{trace, warn};

/// Raw load command header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadCommand {
    pub index: u32,
    pub offset: usize,
    pub cmd: u32,
    pub cmdsize: u32,
}

/// Iterate the load command table of a thin image.
///
/// Every command must have `cmdsize >= 8` and lie within `sizeofcmds`.
pub fn load_commands(data: &[u8], header: &MachHeader) -> Result<Vec<LoadCommand>> {
    let start = header.class.header_size();
    let table_len = header.sizeofcmds as usize;
    let end = start
        .checked_add(table_len)
        .filter(|&end| end <= data.len())
        .ok_or(MachOError::Truncated {
            offset: start,
            needed: table_len,
        })?;

    let mut commands = Vec::with_capacity(header.ncmds.min(1024) as usize);
    let mut off = start;
    for index in 0..header.ncmds {
        if off + LOAD_COMMAND_SIZE > end {
            return Err(MachOError::MalformedLoadCommand {
                index,
                offset: off,
                reason: format!("runs past end of command table ({:#x})", end),
            });
        }
        let cmd = data.read_u32(off, header.endian)?;
        let cmdsize = data.read_u32(off + 4, header.endian)?;
        let size = cmdsize as usize;
        if size < LOAD_COMMAND_SIZE {
            return Err(MachOError::MalformedLoadCommand {
                index,
                offset: off,
                reason: format!("cmdsize {} is smaller than a load command", cmdsize),
            });
        }
        if off + size > end {
            return Err(MachOError::MalformedLoadCommand {
                index,
                offset: off,
                reason: format!("cmdsize {} runs past end of command table", cmdsize),
            });
        }

        trace!(index, offset = off, cmd = format_args!("{:#x}", cmd), cmdsize, "Load command");
        commands.push(LoadCommand {
            index,
            offset: off,
            cmd,
            cmdsize,
        });
        off += size;
    }

    Ok(commands)
}

/// Parse a segment command and the section headers that follow it
pub fn parse_segment_command(
    data: &[u8],
    command: &LoadCommand,
    header: &MachHeader,
) -> Result<(SegmentCommand, Vec<SectionHeader>)> {
    let endian = header.endian;
    let off = command.offset;
    let seg_size = header.class.segment_command_size();
    let sect_size = header.class.section_size();

    let expected = match header.class {
        MachOClass::MachO32 => LC_SEGMENT,
        MachOClass::MachO64 => LC_SEGMENT_64,
    };
    if command.cmd & !LC_REQ_DYLD != expected {
        return Err(MachOError::MalformedLoadCommand {
            index: command.index,
            offset: off,
            reason: format!(
                "segment command {:#x} does not match a {}-bit image",
                command.cmd,
                if header.class == MachOClass::MachO64 { 64 } else { 32 }
            ),
        });
    }

    if (command.cmdsize as usize) < seg_size {
        return Err(MachOError::MalformedLoadCommand {
            index: command.index,
            offset: off,
            reason: format!("segment command needs {} bytes, has {}", seg_size, command.cmdsize),
        });
    }

    let segname = data.read_name(off + 8)?;
    let segment = match header.class {
        MachOClass::MachO32 => SegmentCommand {
            segname,
            vmaddr: data.read_u32(off + 24, endian)? as u64,
            vmsize: data.read_u32(off + 28, endian)? as u64,
            fileoff: data.read_u32(off + 32, endian)? as u64,
            filesize: data.read_u32(off + 36, endian)? as u64,
            maxprot: data.read_i32(off + 40, endian)?,
            initprot: data.read_i32(off + 44, endian)?,
            nsects: data.read_u32(off + 48, endian)?,
            flags: data.read_u32(off + 52, endian)?,
        },
        MachOClass::MachO64 => SegmentCommand {
            segname,
            vmaddr: data.read_u64(off + 24, endian)?,
            vmsize: data.read_u64(off + 32, endian)?,
            fileoff: data.read_u64(off + 40, endian)?,
            filesize: data.read_u64(off + 48, endian)?,
            maxprot: data.read_i32(off + 56, endian)?,
            initprot: data.read_i32(off + 60, endian)?,
            nsects: data.read_u32(off + 64, endian)?,
            flags: data.read_u32(off + 68, endian)?,
        },
    };

    let needed = (segment.nsects as usize)
        .checked_mul(sect_size)
        .and_then(|n| n.checked_add(seg_size));
    if needed.map_or(true, |n| n > command.cmdsize as usize) {
        return Err(MachOError::MalformedLoadCommand {
            index: command.index,
            offset: off,
            reason: format!(
                "{} sections do not fit in cmdsize {}",
                segment.nsects, command.cmdsize
            ),
        });
    }

    let mut sections = Vec::with_capacity(segment.nsects as usize);
    for i in 0..segment.nsects as usize {
        let s = off + seg_size + i * sect_size;
        let sectname = data.read_name(s)?;
        let segname = data.read_name(s + 16)?;
        let section = match header.class {
            MachOClass::MachO32 => SectionHeader {
                sectname,
                segname,
                addr: data.read_u32(s + 32, endian)? as u64,
                size: data.read_u32(s + 36, endian)? as u64,
                offset: data.read_u32(s + 40, endian)?,
                align: data.read_u32(s + 44, endian)?,
                flags: data.read_u32(s + 56, endian)?,
            },
            MachOClass::MachO64 => SectionHeader {
                sectname,
                segname,
                addr: data.read_u64(s + 32, endian)?,
                size: data.read_u64(s + 40, endian)?,
                offset: data.read_u32(s + 48, endian)?,
                align: data.read_u32(s + 52, endian)?,
                flags: data.read_u32(s + 64, endian)?,
            },
        };
        sections.push(section);
    }

    Ok((segment, sections))
}

/// Collect every segment of a thin image.
///
/// `data` is the image itself (a whole thin file or one fat slice) and
/// `base` its offset within the file; returned offsets are absolute.
pub fn parse_segments(data: &[u8], header: &MachHeader, base: u64) -> Result<Vec<Segment>> {
    let limit = data.len() as u64;
    let mut segments = Vec::new();

    for command in load_commands(data, header)? {
        let kind = command.cmd & !LC_REQ_DYLD;
        if kind != LC_SEGMENT && kind != LC_SEGMENT_64 {
            continue;
        }

        let (raw, raw_sections) = parse_segment_command(data, &command, header)?;
        let segname_offset = command.offset + 8;
        let name = decode_name(&raw.segname, segname_offset)?;

        let seg_size = header.class.segment_command_size();
        let sect_size = header.class.section_size();
        let mut sections = Vec::with_capacity(raw_sections.len());
        for (i, sh) in raw_sections.iter().enumerate() {
            let sh_offset = command.offset + seg_size + i * sect_size;
            let sect_name = decode_name(&sh.sectname, sh_offset)?;
            let declared = decode_name(&sh.segname, sh_offset + 16)?;
            // The section's own segname wins: object files keep every
            // section in a single unnamed segment.
            let segment_name = if declared.is_empty() {
                name.clone()
            } else {
                declared
            };

            let file_backed = !sh.is_zerofill();
            if file_backed && !check_range(sh.offset as u64, sh.size, limit) {
                warn!(
                    segment = %segment_name,
                    section = %sect_name,
                    offset = sh.offset,
                    size = sh.size,
                    limit,
                    "Section exceeds image bounds"
                );
                return Err(MachOError::SectionOutOfRange {
                    segment: segment_name,
                    section: sect_name,
                    offset: sh.offset as u64,
                    size: sh.size,
                    limit,
                });
            }

            sections.push(Section {
                name: sect_name,
                segment_name,
                offset: if file_backed { base + sh.offset as u64 } else { 0 },
                size: sh.size,
                address: sh.addr,
                flags: sh.flags,
                file_backed,
            });
        }

        trace!(
            segment = %name,
            fileoff = raw.fileoff,
            filesize = raw.filesize,
            nsects = raw.nsects,
            "Parsed segment"
        );
        segments.push(Segment {
            name,
            vm_address: raw.vmaddr,
            vm_size: raw.vmsize,
            file_offset: base.saturating_add(raw.fileoff),
            file_size: raw.filesize,
            sections,
        });
    }

    Ok(segments)
}

//! In-memory Mach-O images for tests and benchmarks

use crate::formats::macho::types::*;

#[derive(Debug, Clone)]
pub struct FixtureSection {
    name: String,
    segname: Option<String>,
    offset: u32,
    content: Vec<u8>,
    size: Option<u64>,
    flags: u32,
}

impl FixtureSection {
    /// Section whose declared size is `content.len()`
    pub fn new(name: &str, offset: u32, content: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            segname: None,
            offset,
            content: content.to_vec(),
            size: None,
            flags: 0,
        }
    }

    /// Override the declared size without changing the written content
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn segname(mut self, segname: &str) -> Self {
        self.segname = Some(segname.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct FixtureSegment {
    name: String,
    sections: Vec<FixtureSection>,
}

impl FixtureSegment {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, section: FixtureSection) -> Self {
        self.sections.push(section);
        self
    }
}

#[derive(Debug, Clone)]
enum Command {
    Segment(FixtureSegment),
    Raw(u32, Vec<u8>),
}

/// Writes a thin Mach-O image with the requested load commands
#[derive(Debug, Clone)]
pub struct MachOBuilder {
    class: MachOClass,
    endian: Endianness,
    cpu: CpuType,
    commands: Vec<Command>,
}

impl Default for MachOBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MachOBuilder {
    pub fn new() -> Self {
        Self {
            class: MachOClass::MachO64,
            endian: Endianness::Little,
            cpu: CpuType::X86_64,
            commands: Vec::new(),
        }
    }

    pub fn class(mut self, class: MachOClass) -> Self {
        self.class = class;
        self
    }

    pub fn endian(mut self, endian: Endianness) -> Self {
        self.endian = endian;
        self
    }

    pub fn cpu(mut self, cpu: CpuType) -> Self {
        self.cpu = cpu;
        self
    }

    pub fn segment(mut self, segment: FixtureSegment) -> Self {
        self.commands.push(Command::Segment(segment));
        self
    }

    pub fn raw_command(mut self, cmd: u32, payload: &[u8]) -> Self {
        self.commands.push(Command::Raw(cmd, payload.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let header_size = self.class.header_size();
        let seg_size = self.class.segment_command_size();
        let sect_size = self.class.section_size();
        let is_64 = self.class == MachOClass::MachO64;

        let mut table = Vec::new();
        let mut contents: Vec<(usize, &[u8])> = Vec::new();
        for command in &self.commands {
            match command {
                Command::Raw(cmd, payload) => {
                    self.put_u32(&mut table, *cmd);
                    self.put_u32(&mut table, (8 + payload.len()) as u32);
                    table.extend_from_slice(payload);
                }
                Command::Segment(segment) => {
                    let cmdsize = seg_size + segment.sections.len() * sect_size;
                    let fileoff = segment
                        .sections
                        .iter()
                        .map(|s| s.offset as u64)
                        .min()
                        .unwrap_or(0);
                    let fileend = segment
                        .sections
                        .iter()
                        .map(|s| s.offset as u64 + s.content.len() as u64)
                        .max()
                        .unwrap_or(0);

                    self.put_u32(
                        &mut table,
                        if is_64 { LC_SEGMENT_64 } else { LC_SEGMENT },
                    );
                    self.put_u32(&mut table, cmdsize as u32);
                    table.extend_from_slice(&name_field(&segment.name));
                    self.put_word(&mut table, 0x1_0000_0000 + fileoff); // vmaddr
                    self.put_word(&mut table, fileend - fileoff); // vmsize
                    self.put_word(&mut table, fileoff);
                    self.put_word(&mut table, fileend - fileoff);
                    self.put_u32(&mut table, 5); // maxprot
                    self.put_u32(&mut table, 5); // initprot
                    self.put_u32(&mut table, segment.sections.len() as u32);
                    self.put_u32(&mut table, 0);

                    for section in &segment.sections {
                        let segname = section.segname.as_deref().unwrap_or(&segment.name);
                        table.extend_from_slice(&name_field(&section.name));
                        table.extend_from_slice(&name_field(segname));
                        self.put_word(&mut table, 0x1_0000_0000 + section.offset as u64);
                        self.put_word(
                            &mut table,
                            section.size.unwrap_or(section.content.len() as u64),
                        );
                        self.put_u32(&mut table, section.offset);
                        self.put_u32(&mut table, 0); // align
                        self.put_u32(&mut table, 0); // reloff
                        self.put_u32(&mut table, 0); // nreloc
                        self.put_u32(&mut table, section.flags);
                        self.put_u32(&mut table, 0); // reserved1
                        self.put_u32(&mut table, 0); // reserved2
                        if is_64 {
                            self.put_u32(&mut table, 0); // reserved3
                        }
                        contents.push((section.offset as usize, section.content.as_slice()));
                    }
                }
            }
        }

        let mut data = Vec::with_capacity(header_size + table.len());
        let magic = if is_64 { MH_MAGIC_64 } else { MH_MAGIC };
        self.put_u32(&mut data, magic);
        self.put_u32(&mut data, self.cpu.raw() as u32);
        self.put_u32(&mut data, 3); // cpusubtype
        self.put_u32(&mut data, MH_EXECUTE);
        self.put_u32(&mut data, self.commands.len() as u32);
        self.put_u32(&mut data, table.len() as u32);
        self.put_u32(&mut data, 0x0020_0085); // flags
        if is_64 {
            self.put_u32(&mut data, 0);
        }
        data.extend_from_slice(&table);

        let end = contents
            .iter()
            .map(|(offset, bytes)| offset + bytes.len())
            .max()
            .unwrap_or(0);
        if end > data.len() {
            data.resize(end, 0);
        }
        for (offset, bytes) in contents {
            data[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
        data
    }

    fn put_u32(&self, out: &mut Vec<u8>, value: u32) {
        match self.endian {
            Endianness::Little => out.extend_from_slice(&value.to_le_bytes()),
            Endianness::Big => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    fn put_word(&self, out: &mut Vec<u8>, value: u64) {
        match self.class {
            MachOClass::MachO32 => self.put_u32(out, value as u32),
            MachOClass::MachO64 => match self.endian {
                Endianness::Little => out.extend_from_slice(&value.to_le_bytes()),
                Endianness::Big => out.extend_from_slice(&value.to_be_bytes()),
            },
        }
    }
}

fn name_field(name: &str) -> [u8; NAME_FIELD_SIZE] {
    let mut field = [0u8; NAME_FIELD_SIZE];
    let len = name.len().min(NAME_FIELD_SIZE);
    field[..len].copy_from_slice(&name.as_bytes()[..len]);
    field
}

/// Wrap thin images into a 32-bit fat binary, each slice page aligned
pub fn fat_binary(slices: &[(CpuType, Vec<u8>)]) -> Vec<u8> {
    const PAGE: usize = 0x1000;
    let mut data = Vec::new();
    data.extend_from_slice(&FAT_MAGIC.to_be_bytes());
    data.extend_from_slice(&(slices.len() as u32).to_be_bytes());

    let mut offset = PAGE;
    let mut placed = Vec::new();
    for (cpu, image) in slices {
        data.extend_from_slice(&cpu.raw().to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&(offset as u32).to_be_bytes());
        data.extend_from_slice(&(image.len() as u32).to_be_bytes());
        data.extend_from_slice(&12u32.to_be_bytes());
        placed.push((offset, image));
        offset = (offset + image.len()).div_ceil(PAGE) * PAGE;
    }

    for (offset, image) in placed {
        data.resize(offset, 0);
        data.extend_from_slice(image);
    }
    data
}

//! Core Mach-O types and constants

use std::fmt;

/// Mach-O parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachOError {
    InvalidMagic,
    Truncated { offset: usize, needed: usize },
    MalformedLoadCommand { index: u32, offset: usize, reason: String },
    InvalidName { offset: usize },
    SectionOutOfRange { segment: String, section: String, offset: u64, size: u64, limit: u64 },
    SliceOutOfRange { index: u32, offset: u64, size: u64 },
    NoMatchingSlice(CpuType),
    EmptyFatBinary,
}

impl fmt::Display for MachOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic => write!(f, "Not a Mach-O image (unrecognized magic)"),
            Self::Truncated { offset, needed } => {
                write!(f, "Truncated at {:#x}, needed {} bytes", offset, needed)
            }
            Self::MalformedLoadCommand {
                index,
                offset,
                reason,
            } => write!(
                f,
                "Malformed load command #{} at {:#x}: {}",
                index, offset, reason
            ),
            Self::InvalidName { offset } => write!(f, "Name at {:#x} is not UTF-8", offset),
            Self::SectionOutOfRange {
                segment,
                section,
                offset,
                size,
                limit,
            } => write!(
                f,
                "Section {},{} range {:#x}+{:#x} exceeds image length {:#x}",
                segment, section, offset, size, limit
            ),
            Self::SliceOutOfRange {
                index,
                offset,
                size,
            } => write!(
                f,
                "Fat slice #{} range {:#x}+{:#x} exceeds file length",
                index, offset, size
            ),
            Self::NoMatchingSlice(cpu) => write!(f, "No fat slice for CPU type {}", cpu),
            Self::EmptyFatBinary => write!(f, "Fat binary declares no architectures"),
        }
    }
}

impl std::error::Error for MachOError {}

pub type Result<T> = std::result::Result<T, MachOError>;

pub const MH_MAGIC: u32 = 0xfeedface;
pub const MH_CIGAM: u32 = 0xcefaedfe;
pub const MH_MAGIC_64: u32 = 0xfeedfacf;
pub const MH_CIGAM_64: u32 = 0xcffaedfe;
pub const FAT_MAGIC: u32 = 0xcafebabe;
pub const FAT_MAGIC_64: u32 = 0xcafebabf;

/// Java class files share `FAT_MAGIC`; real fat headers never list this many slices.
pub const MAX_FAT_ARCHES: u32 = 32;

/// Load command types
pub const LC_REQ_DYLD: u32 = 0x8000_0000;
pub const LC_SEGMENT: u32 = 0x1;
pub const LC_SEGMENT_64: u32 = 0x19;

/// Structure sizes
pub const MACH_HEADER_SIZE: usize = 28;
pub const MACH_HEADER_64_SIZE: usize = 32;
pub const LOAD_COMMAND_SIZE: usize = 8;
pub const SEGMENT_COMMAND_SIZE: usize = 56;
pub const SEGMENT_COMMAND_64_SIZE: usize = 72;
pub const SECTION_SIZE: usize = 68;
pub const SECTION_64_SIZE: usize = 80;
pub const FAT_HEADER_SIZE: usize = 8;
pub const FAT_ARCH_SIZE: usize = 20;
pub const FAT_ARCH_64_SIZE: usize = 32;

/// Width of the fixed `segname` / `sectname` fields
pub const NAME_FIELD_SIZE: usize = 16;

/// Section type lives in the low byte of `flags`
pub const SECTION_TYPE_MASK: u32 = 0x0000_00ff;
pub const S_ZEROFILL: u32 = 0x1;
pub const S_GB_ZEROFILL: u32 = 0xc;
pub const S_THREAD_LOCAL_ZEROFILL: u32 = 0x12;

/// File types
pub const MH_OBJECT: u32 = 0x1;
pub const MH_EXECUTE: u32 = 0x2;
pub const MH_DYLIB: u32 = 0x6;
pub const MH_BUNDLE: u32 = 0x8;

pub const CPU_ARCH_ABI64: i32 = 0x0100_0000;
pub const CPU_ARCH_ABI64_32: i32 = 0x0200_0000;

/// Byte order of the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Mach-O word size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachOClass {
    MachO32,
    MachO64,
}

impl MachOClass {
    pub fn header_size(&self) -> usize {
        match self {
            MachOClass::MachO32 => MACH_HEADER_SIZE,
            MachOClass::MachO64 => MACH_HEADER_64_SIZE,
        }
    }

    pub fn segment_command_size(&self) -> usize {
        match self {
            MachOClass::MachO32 => SEGMENT_COMMAND_SIZE,
            MachOClass::MachO64 => SEGMENT_COMMAND_64_SIZE,
        }
    }

    pub fn section_size(&self) -> usize {
        match self {
            MachOClass::MachO32 => SECTION_SIZE,
            MachOClass::MachO64 => SECTION_64_SIZE,
        }
    }
}

/// CPU type as recorded in the header and fat arch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuType {
    X86,
    X86_64,
    Arm,
    Arm64,
    Arm64_32,
    PowerPC,
    PowerPC64,
    Other(i32),
}

impl CpuType {
    /// CPU type of the machine this code was compiled for
    pub fn host() -> Option<Self> {
        if cfg!(target_arch = "x86_64") {
            Some(CpuType::X86_64)
        } else if cfg!(target_arch = "aarch64") {
            Some(CpuType::Arm64)
        } else if cfg!(target_arch = "x86") {
            Some(CpuType::X86)
        } else if cfg!(target_arch = "arm") {
            Some(CpuType::Arm)
        } else {
            None
        }
    }

    pub fn raw(&self) -> i32 {
        match self {
            CpuType::X86 => 7,
            CpuType::X86_64 => 7 | CPU_ARCH_ABI64,
            CpuType::Arm => 12,
            CpuType::Arm64 => 12 | CPU_ARCH_ABI64,
            CpuType::Arm64_32 => 12 | CPU_ARCH_ABI64_32,
            CpuType::PowerPC => 18,
            CpuType::PowerPC64 => 18 | CPU_ARCH_ABI64,
            CpuType::Other(v) => *v,
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        match self {
            CpuType::X86 => Some("x86"),
            CpuType::X86_64 => Some("x86_64"),
            CpuType::Arm => Some("arm"),
            CpuType::Arm64 => Some("arm64"),
            CpuType::Arm64_32 => Some("arm64_32"),
            CpuType::PowerPC => Some("ppc"),
            CpuType::PowerPC64 => Some("ppc64"),
            CpuType::Other(_) => None,
        }
    }
}

impl From<i32> for CpuType {
    fn from(val: i32) -> Self {
        match val {
            7 => CpuType::X86,
            0x0100_0007 => CpuType::X86_64,
            12 => CpuType::Arm,
            0x0100_000c => CpuType::Arm64,
            0x0200_000c => CpuType::Arm64_32,
            18 => CpuType::PowerPC,
            0x0100_0012 => CpuType::PowerPC64,
            other => CpuType::Other(other),
        }
    }
}

impl std::str::FromStr for CpuType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86" | "i386" => Ok(CpuType::X86),
            "x86_64" | "x86-64" | "amd64" => Ok(CpuType::X86_64),
            "arm" => Ok(CpuType::Arm),
            "arm64" | "aarch64" => Ok(CpuType::Arm64),
            "arm64_32" => Ok(CpuType::Arm64_32),
            "ppc" | "powerpc" => Ok(CpuType::PowerPC),
            "ppc64" | "powerpc64" => Ok(CpuType::PowerPC64),
            other => other
                .strip_prefix("0x")
                .map(|hex| i32::from_str_radix(hex, 16))
                .unwrap_or_else(|| other.parse::<i32>())
                .map(CpuType::from)
                .map_err(|_| format!("unknown CPU type: {}", s)),
        }
    }
}

impl fmt::Display for CpuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#x}", self.raw()),
        }
    }
}

impl serde::Serialize for CpuType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for CpuType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Mach header (32 and 64-bit share the layout up to `flags`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachHeader {
    pub magic: u32,
    pub class: MachOClass,
    pub endian: Endianness,
    pub cputype: i32,
    pub cpusubtype: i32,
    pub filetype: u32,
    pub ncmds: u32,
    pub sizeofcmds: u32,
    pub flags: u32,
}

impl MachHeader {
    pub fn cpu(&self) -> CpuType {
        CpuType::from(self.cputype)
    }

    pub fn is_64(&self) -> bool {
        self.class == MachOClass::MachO64
    }

    pub fn is_executable(&self) -> bool {
        self.filetype == MH_EXECUTE
    }
}

/// One entry of a fat arch table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatArch {
    pub cputype: i32,
    pub cpusubtype: i32,
    pub offset: u64,
    pub size: u64,
    pub align: u32,
}

impl FatArch {
    pub fn cpu(&self) -> CpuType {
        CpuType::from(self.cputype)
    }
}

/// Segment load command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentCommand {
    pub segname: [u8; NAME_FIELD_SIZE],
    pub vmaddr: u64,
    pub vmsize: u64,
    pub fileoff: u64,
    pub filesize: u64,
    pub maxprot: i32,
    pub initprot: i32,
    pub nsects: u32,
    pub flags: u32,
}

/// Section header following a segment command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub sectname: [u8; NAME_FIELD_SIZE],
    pub segname: [u8; NAME_FIELD_SIZE],
    pub addr: u64,
    pub size: u64,
    pub offset: u32,
    pub align: u32,
    pub flags: u32,
}

impl SectionHeader {
    pub fn section_type(&self) -> u32 {
        self.flags & SECTION_TYPE_MASK
    }

    pub fn is_zerofill(&self) -> bool {
        matches!(
            self.section_type(),
            S_ZEROFILL | S_GB_ZEROFILL | S_THREAD_LOCAL_ZEROFILL
        )
    }
}

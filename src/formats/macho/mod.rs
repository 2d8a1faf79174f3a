//! Mach-O image loader
//!
//! Reads the header, walks the load command table and collects every
//! segment with its sections. Universal (fat) files are supported by
//! choosing one architecture slice; section offsets are always reported
//! relative to the start of the file, not the slice.

pub mod commands;
pub mod fat;
pub mod headers;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "test-fixtures"))]
#[doc(hidden)]
pub mod fixtures;

use crate::config::ExtractConfig;
use crate::image::{Segment, SegmentedImage};
use crate::io::map_file;
use commands::parse_segments;
use headers::{detect, parse_header, ContainerKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info_span};
pub use types::*;

/// A parsed Mach-O image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachOImage {
    path: PathBuf,
    file_len: u64,
    header: MachHeader,
    slice: Option<FatArch>,
    segments: Vec<Segment>,
}

impl MachOImage {
    /// Load and parse the image at `path`.
    ///
    /// The file is mapped only while parsing; the mapping is released
    /// before this returns.
    pub fn load<P: AsRef<Path>>(path: P, config: &ExtractConfig) -> crate::Result<Self> {
        let path = path.as_ref();
        let _span = info_span!("load_image", path = %path.display()).entered();

        let mapped = map_file(path, config.max_image_size)?;
        let image = Self::parse(mapped.as_slice(), path, config.cpu)?;
        debug!(
            segments = image.segments.len(),
            sections = image.sections().count(),
            fat = image.slice.is_some(),
            "Parsed Mach-O image"
        );
        Ok(image)
    }

    /// Parse an image already in memory. `path` is recorded for later reads.
    pub fn parse(data: &[u8], path: impl Into<PathBuf>, cpu: Option<CpuType>) -> Result<Self> {
        let (slice, image) = match detect(data)? {
            ContainerKind::Thin => (None, data),
            ContainerKind::Fat { is_64 } => {
                let arches = fat::parse_fat_arches(data, is_64)?;
                let arch = fat::select_slice(&arches, cpu)?;
                // parse_fat_arches has bounds-checked every slice
                let start = arch.offset as usize;
                let end = start + arch.size as usize;
                (Some(arch), &data[start..end])
            }
        };

        let header = parse_header(image)?;
        let base = slice.map(|a| a.offset).unwrap_or(0);
        let segments = parse_segments(image, &header, base)?;

        Ok(Self {
            path: path.into(),
            file_len: data.len() as u64,
            header,
            slice,
            segments,
        })
    }

    /// Get Mach header of the parsed (possibly sliced) image
    pub fn header(&self) -> &MachHeader {
        &self.header
    }

    /// Fat slice the image was taken from
    pub fn slice(&self) -> Option<&FatArch> {
        self.slice.as_ref()
    }

    /// Length of the whole file at parse time
    pub fn file_len(&self) -> u64 {
        self.file_len
    }
}

impl SegmentedImage for MachOImage {
    fn source(&self) -> &Path {
        &self.path
    }

    fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

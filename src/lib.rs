//! Read build-time strings embedded in a named section of a Mach-O image.
//!
//! The pipeline is: load the image ([`MachOImage::load`]), index its sections
//! ([`SectionIndex`]), read the byte range of one section ([`SectionReader`])
//! and decode it ([`decode_text`]).
//!
//! ```no_run
//! use embedded_resource::{extract_text, ExtractConfig};
//!
//! let stamp = extract_text("/usr/local/bin/tool", &ExtractConfig::default())?;
//! println!("built at {}", stamp);
//! # Ok::<(), embedded_resource::ResourceError>(())
//! ```

pub mod config;
pub mod error;
pub mod formats;
pub mod image;
pub mod io;
pub mod locator;
pub mod logging;

pub use config::ExtractConfig;
pub use error::{ErrorKind, ResourceError, Result};
pub use formats::macho::{CpuType, MachOError, MachOImage};
pub use image::{Section, Segment, SegmentedImage};
pub use locator::{decode_text, read_section, SectionIndex, SectionReader};

use bytes::Bytes;
use std::path::Path;
use tracing::info_span;

/// Load `path` and return the raw bytes of the configured section.
pub fn extract_section<P: AsRef<Path>>(path: P, config: &ExtractConfig) -> Result<Bytes> {
    let path = path.as_ref();
    let _span = info_span!(
        "extract_section",
        path = %path.display(),
        segment = %config.segment,
        section = %config.section
    )
    .entered();

    let image = MachOImage::load(path, config)?;
    SectionReader::new(&image, config.max_section_size).read(&config.segment, &config.section)
}

/// Load `path` and return the configured section decoded as UTF-8 text.
pub fn extract_text<P: AsRef<Path>>(path: P, config: &ExtractConfig) -> Result<String> {
    let bytes = extract_section(path, config)?;
    decode_text(&bytes, config.trim_trailing_nul)
}

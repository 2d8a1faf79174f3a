//! Format-independent view of an executable image.
//!
//! A container format parser produces [`Segment`]s holding [`Section`]s and
//! exposes them through [`SegmentedImage`]. Everything downstream of the
//! loader (indexing, bounded reads) only depends on that trait.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

/// A named sub-region of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section name, e.g. `myinfo`
    pub name: String,
    /// Segment name the section is filed under
    pub segment_name: String,
    /// Absolute byte offset from the start of the file
    pub offset: u64,
    /// Size in bytes
    pub size: u64,
    /// Virtual address
    pub address: u64,
    /// Raw format-specific flags
    pub flags: u32,
    /// False for zero-fill sections, which occupy no bytes in the file
    pub file_backed: bool,
}

impl Section {
    /// Byte range of the section's content in the file.
    pub fn file_range(&self) -> Option<Range<u64>> {
        if !self.file_backed {
            return None;
        }
        self.offset
            .checked_add(self.size)
            .map(|end| self.offset..end)
    }
}

/// A named top-level region of an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub vm_address: u64,
    pub vm_size: u64,
    /// Absolute file offset
    pub file_offset: u64,
    pub file_size: u64,
    /// Sections in load command order
    pub sections: Vec<Section>,
}

/// Capability set shared by every supported container format.
pub trait SegmentedImage {
    /// Path the image was loaded from
    fn source(&self) -> &Path;

    /// Segments in file order, duplicates preserved
    fn segments(&self) -> &[Segment];

    /// Every section of every segment, paired with its segment, in file order
    fn sections(&self) -> impl Iterator<Item = (&Segment, &Section)> + '_ {
        self.segments()
            .iter()
            .flat_map(|segment| segment.sections.iter().map(move |section| (segment, section)))
    }
}

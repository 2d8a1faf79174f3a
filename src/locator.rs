//! Section lookup and bounded reads.
//!
//! [`SectionIndex`] maps (segment name, section name) to the section's
//! location; [`read_section`] pulls exactly that byte range out of the file
//! the image was loaded from.

use crate::error::{ResourceError, Result};
use crate::image::{Section, SegmentedImage};
use crate::io::read_exact_at;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, debug_span};

/// Lookup from segment name to section name to section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionIndex {
    segments: HashMap<String, HashMap<String, Section>>,
}

impl SectionIndex {
    /// Index every section of `image`.
    ///
    /// Sections are keyed by the segment name they declare. When the same
    /// pair occurs more than once the later one in file order wins.
    pub fn build<I: SegmentedImage + ?Sized>(image: &I) -> Self {
        let mut segments: HashMap<String, HashMap<String, Section>> = HashMap::new();
        for segment in image.segments() {
            segments.entry(segment.name.clone()).or_default();
        }
        for (_, section) in image.sections() {
            let previous = segments
                .entry(section.segment_name.clone())
                .or_default()
                .insert(section.name.clone(), section.clone());
            if let Some(previous) = previous {
                debug!(
                    segment = %section.segment_name,
                    section = %section.name,
                    replaced_offset = previous.offset,
                    offset = section.offset,
                    "Duplicate section name, keeping the later one"
                );
            }
        }
        Self { segments }
    }

    /// Resolve a section by exact, case-sensitive names.
    pub fn lookup(&self, segment: &str, section: &str) -> Result<&Section> {
        let sections = self.segments.get(segment).ok_or_else(|| {
            debug!(segment, "Segment not present");
            ResourceError::not_found(segment, section)
        })?;
        sections.get(section).ok_or_else(|| {
            debug!(segment, section, "Section not present in segment");
            ResourceError::not_found(segment, section)
        })
    }

    pub fn contains(&self, segment: &str, section: &str) -> bool {
        self.lookup(segment, section).is_ok()
    }

    /// Number of indexed (segment, section) pairs
    pub fn len(&self) -> usize {
        self.segments.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Segment names, including segments without sections, sorted
    pub fn segment_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.segments.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All indexed sections ordered by segment then section name
    pub fn entries(&self) -> Vec<&Section> {
        self.segments
            .iter()
            .flat_map(|(segment, sections)| {
                sections
                    .iter()
                    .map(move |(name, section)| ((segment.as_str(), name.as_str()), section))
            })
            .collect::<BTreeMap<_, _>>()
            .into_values()
            .collect()
    }
}

/// Read the file bytes of `section` from `path`.
///
/// The result is exactly `section.size` bytes or an error. Sections larger
/// than `max_size` are refused before any allocation.
pub fn read_section(path: &Path, section: &Section, max_size: u64) -> Result<Bytes> {
    let range = section.file_range().ok_or_else(|| ResourceError::NoFileData {
        segment: section.segment_name.clone(),
        section: section.name.clone(),
    })?;

    if section.size > max_size {
        return Err(ResourceError::SectionTooLarge {
            segment: section.segment_name.clone(),
            section: section.name.clone(),
            size: section.size,
            limit: max_size,
        });
    }

    read_exact_at(path, range.start, range.end - range.start)
}

/// An image together with its section index.
pub struct SectionReader<'a, I: SegmentedImage + ?Sized> {
    image: &'a I,
    index: SectionIndex,
    max_section_size: u64,
}

impl<'a, I: SegmentedImage + ?Sized> SectionReader<'a, I> {
    pub fn new(image: &'a I, max_section_size: u64) -> Self {
        Self {
            image,
            index: SectionIndex::build(image),
            max_section_size,
        }
    }

    pub fn index(&self) -> &SectionIndex {
        &self.index
    }

    pub fn image(&self) -> &'a I {
        self.image
    }

    /// Look up a section and read its bytes from the image's source file.
    ///
    /// Nothing is read when the lookup fails.
    pub fn read(&self, segment: &str, section: &str) -> Result<Bytes> {
        let _span = debug_span!("read_section", segment, section).entered();
        let found = self.index.lookup(segment, section)?;
        debug!(offset = found.offset, size = found.size, "Resolved section");
        read_section(self.image.source(), found, self.max_section_size)
    }
}

/// Decode section bytes as UTF-8, optionally dropping trailing NUL padding.
pub fn decode_text(bytes: &[u8], trim_trailing_nul: bool) -> Result<String> {
    let text = std::str::from_utf8(bytes)?;
    let text = if trim_trailing_nul {
        text.trim_end_matches('\0')
    } else {
        text
    };
    Ok(text.to_string())
}

//! Bounded file access.
//!
//! Parsing works on a read-only memory map of the whole image; extracting a
//! section is a separate seek + exact read on a fresh handle. Both release
//! their file resources when the returned values are dropped.

use crate::error::{ResourceError, Result};
use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace, warn};

/// A read-only view of a whole file.
pub struct MappedFile {
    // None when the file size is zero; memmap cannot map empty files.
    mmap: Option<Mmap>,
}

impl MappedFile {
    pub fn as_slice(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Memory-map `path`, refusing files larger than `max_size` bytes.
pub fn map_file(path: &Path, max_size: u64) -> Result<MappedFile> {
    let file = File::open(path)?;
    let file_size = file.metadata()?.len();

    debug!(
        path = %path.display(),
        size = file_size,
        limit = max_size,
        "Mapping file"
    );

    if file_size > max_size {
        warn!(
            path = %path.display(),
            size = file_size,
            limit = max_size,
            "File is too large"
        );
        return Err(ResourceError::FileTooLarge {
            limit: max_size,
            found: file_size,
        });
    }

    let mmap = if file_size == 0 {
        None
    } else {
        // Safety: read-only map of a regular file; the map does not outlive
        // the MappedFile and nothing in this crate writes to the file.
        Some(unsafe { Mmap::map(&file)? })
    };

    Ok(MappedFile { mmap })
}

/// Read exactly `len` bytes at `offset`.
///
/// A range that ends past EOF is an `UnexpectedEof` I/O error; a short
/// result is never returned.
pub fn read_exact_at(path: &Path, offset: u64, len: u64) -> Result<Bytes> {
    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();
    if offset.checked_add(len).map_or(true, |end| end > file_size) {
        warn!(
            path = %path.display(),
            offset,
            len,
            file_size,
            "Read range exceeds file length"
        );
        return Err(ResourceError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!(
                "range {:#x}+{:#x} exceeds file length {:#x}",
                offset, len, file_size
            ),
        )));
    }

    let capacity = usize::try_from(len).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::OutOfMemory, "read length exceeds address space")
    })?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; capacity];
    file.read_exact(&mut buf)?;

    trace!(path = %path.display(), offset, len, "Performed read");
    Ok(Bytes::from(buf))
}

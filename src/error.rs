//! Error types for section extraction.
//!
//! Every failure of the loader, the locator and the text decoding step is a
//! [`ResourceError`]. [`ErrorKind`] groups the variants into the categories
//! callers act on (the CLI maps them to exit codes).

use crate::formats::macho::MachOError;
use thiserror::Error;

/// Main error type for section extraction.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// File open/seek/read failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Not a supported container, or its tables are inconsistent
    #[error("Invalid binary format: {0}")]
    InvalidFormat(#[from] MachOError),

    /// The requested (segment, section) pair is absent
    #[error("Section not found: {segment},{section}")]
    NotFound { segment: String, section: String },

    /// Section bytes are not valid UTF-8
    #[error("Section content is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("File size of {found} bytes exceeds the maximum allowed size of {limit} bytes")]
    FileTooLarge { limit: u64, found: u64 },

    #[error("Section {segment},{section} is {size} bytes, over the {limit} byte limit")]
    SectionTooLarge {
        segment: String,
        section: String,
        size: u64,
        limit: u64,
    },

    /// Zero-fill sections have no bytes in the file
    #[error("Section {segment},{section} is zero-fill and has no file content")]
    NoFileData { segment: String, section: String },

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Coarse error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Format,
    NotFound,
    Encoding,
    Limit,
    Config,
}

impl ResourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResourceError::Io(_) => ErrorKind::Io,
            ResourceError::InvalidFormat(_) => ErrorKind::Format,
            ResourceError::NotFound { .. } => ErrorKind::NotFound,
            ResourceError::Encoding(_) => ErrorKind::Encoding,
            ResourceError::FileTooLarge { .. }
            | ResourceError::SectionTooLarge { .. }
            | ResourceError::NoFileData { .. } => ErrorKind::Limit,
            ResourceError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn not_found(segment: &str, section: &str) -> Self {
        ResourceError::NotFound {
            segment: segment.to_string(),
            section: section.to_string(),
        }
    }
}

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ResourceError>;

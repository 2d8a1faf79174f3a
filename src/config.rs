//! Configuration for section extraction.
//!
//! Names the section to extract and bounds the work done on an image. All
//! fields have defaults, so a JSON file only needs the fields it changes.

use crate::error::Result;
use crate::formats::macho::CpuType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Segment the build timestamp section lives in.
pub const DEFAULT_SEGMENT: &str = "__TEXT";
/// Name of the build timestamp section.
pub const DEFAULT_SECTION: &str = "myinfo";

/// Settings for one extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Segment name of the target section (default: `__TEXT`).
    pub segment: String,
    /// Section name of the target section (default: `myinfo`).
    pub section: String,
    /// Architecture to pick from a fat binary. `None` prefers the host CPU
    /// and falls back to the first slice.
    pub cpu: Option<CpuType>,
    /// Largest image that will be opened (default: 512 MiB).
    pub max_image_size: u64,
    /// Largest section that will be read (default: 1 MiB).
    pub max_section_size: u64,
    /// Strip trailing NUL padding when decoding text (default: true).
    pub trim_trailing_nul: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            segment: DEFAULT_SEGMENT.to_string(),
            section: DEFAULT_SECTION.to_string(),
            cpu: None,
            max_image_size: 512 * 1024 * 1024,
            max_section_size: 1024 * 1024,
            trim_trailing_nul: true,
        }
    }
}

impl ExtractConfig {
    /// Target a different section, keeping every other setting.
    pub fn with_target(mut self, segment: &str, section: &str) -> Self {
        self.segment = segment.to_string();
        self.section = section.to_string();
        self
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

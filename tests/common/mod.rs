//! Common test utilities and helpers.
//!
//! Fixture images are written from scratch so the tests do not depend on a
//! macOS toolchain or checked-in binaries.

#![allow(dead_code)]


use std::io::Write;
use tempfile::NamedTempFile;

/// Creates a temporary file with the given content.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file
}

/// The stamp used by the end-to-end scenarios: 19 characters and a NUL.
pub const STAMP: &[u8; 20] = b"2024-07-20T10:00:00\0";

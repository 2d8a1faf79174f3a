//! Malformed and hostile inputs must fail cleanly, never panic.

use crate::common::macho::stamped_image;
use crate::common::{create_temp_file, STAMP};
use embedded_resource::{
    extract_section, read_section, ErrorKind, ExtractConfig, MachOError, MachOImage,
    ResourceError, SectionIndex,
};

// Header is 32 bytes; __PAGEZERO's command is 72 bytes, so the __TEXT
// segment command starts at 104 and its second section header at
// 104 + 72 + 80 = 256.
const MYINFO_HEADER: usize = 256;

#[test]
fn section_past_end_of_file_is_rejected_at_load() {
    let mut data = stamped_image(STAMP);
    // size field of myinfo (section_64 + 40)
    data[MYINFO_HEADER + 40..MYINFO_HEADER + 48].copy_from_slice(&0x10_0000u64.to_le_bytes());
    let file = create_temp_file(&data);

    let err = MachOImage::load(file.path(), &ExtractConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        ResourceError::InvalidFormat(MachOError::SectionOutOfRange { ref section, .. })
            if section == "myinfo"
    ));
}

#[test]
fn file_truncated_after_parsing_is_an_io_error() {
    let data = stamped_image(STAMP);
    let image = MachOImage::parse(&data, "unused", None).unwrap();
    let section = SectionIndex::build(&image)
        .lookup("__TEXT", "myinfo")
        .unwrap()
        .clone();

    let short = create_temp_file(&data[..4100]);
    let err = read_section(short.path(), &section, u64::MAX).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn truncated_images_never_panic() {
    let data = stamped_image(STAMP);
    for len in [0, 3, 4, 16, 31, 32, 64, 103, 104, 200, 255, 300, 4095, 4100] {
        let file = create_temp_file(&data[..len]);
        let result = extract_section(file.path(), &ExtractConfig::default());
        let err = result.expect_err("truncated image must not extract");
        assert!(
            matches!(err.kind(), ErrorKind::Format),
            "len {}: unexpected {:?}",
            len,
            err
        );
    }
}

#[test]
fn corrupted_command_sizes_are_format_errors() {
    let base = stamped_image(STAMP);
    for cmdsize in [0u32, 7, 8, 71, 0xffff_fff0] {
        let mut data = base.clone();
        // cmdsize of the __TEXT segment command
        data[108..112].copy_from_slice(&cmdsize.to_le_bytes());
        let file = create_temp_file(&data);
        let err = MachOImage::load(file.path(), &ExtractConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "cmdsize {}", cmdsize);
    }
}

#[test]
fn oversized_image_is_refused() {
    let data = stamped_image(STAMP);
    let file = create_temp_file(&data);
    let config = ExtractConfig {
        max_image_size: 1024,
        ..ExtractConfig::default()
    };
    assert!(matches!(
        MachOImage::load(file.path(), &config),
        Err(ResourceError::FileTooLarge { limit: 1024, .. })
    ));
}

#[test]
fn oversized_section_is_refused() {
    let data = stamped_image(STAMP);
    let file = create_temp_file(&data);
    let config = ExtractConfig {
        max_section_size: 8,
        ..ExtractConfig::default()
    };
    let err = extract_section(file.path(), &config).unwrap_err();
    assert!(matches!(err, ResourceError::SectionTooLarge { size: 20, .. }));
    assert_eq!(err.kind(), ErrorKind::Limit);
}

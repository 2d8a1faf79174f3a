use crate::common::macho::{stamped_image, FixtureSection, FixtureSegment, MachOBuilder};
use crate::common::{create_temp_file, STAMP};
use embedded_resource::{
    extract_section, extract_text, ErrorKind, ExtractConfig, MachOImage, ResourceError,
    SectionIndex, SectionReader, SegmentedImage,
};

#[test]
fn extracts_build_stamp() {
    let data = stamped_image(STAMP);
    let file = create_temp_file(&data);
    let config = ExtractConfig::default();

    let bytes = extract_section(file.path(), &config).unwrap();
    assert_eq!(bytes.len(), 20);
    assert_eq!(&bytes[..], &data[4096..4116]);
    assert_eq!(&bytes[..], STAMP);

    assert_eq!(
        extract_text(file.path(), &config).unwrap(),
        "2024-07-20T10:00:00"
    );
}

#[test]
fn resolved_location_matches_recorded_offsets() {
    let data = stamped_image(STAMP);
    let file = create_temp_file(&data);
    let image = MachOImage::load(file.path(), &ExtractConfig::default()).unwrap();
    let index = SectionIndex::build(&image);

    let info = index.lookup("__TEXT", "myinfo").unwrap();
    assert_eq!(info.offset, 4096);
    assert_eq!(info.size, 20);

    let text = index.lookup("__TEXT", "__text").unwrap();
    assert_eq!(text.offset, 0x800);
    assert_eq!(text.size, 32);
}

#[test]
fn missing_section_is_not_found() {
    let data = stamped_image(STAMP);
    let file = create_temp_file(&data);
    let config = ExtractConfig::default().with_target("__TEXT", "buildinfo");

    let err = extract_section(file.path(), &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(
        err,
        ResourceError::NotFound { ref segment, ref section }
            if segment == "__TEXT" && section == "buildinfo"
    ));
}

#[test]
fn image_without_stamp_section() {
    let data = MachOBuilder::new()
        .segment(
            FixtureSegment::new("__TEXT")
                .section(FixtureSection::new("__text", 0x400, &[0x90; 4])),
        )
        .build();
    let file = create_temp_file(&data);
    let err = extract_text(file.path(), &ExtractConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn text_file_is_a_format_error() {
    let file = create_temp_file(b"This is a plain text file.\nIt has no Mach-O header.\n");
    let err = MachOImage::load(file.path(), &ExtractConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);

    let err = extract_text(file.path(), &ExtractConfig::default()).unwrap_err();
    assert!(matches!(err, ResourceError::InvalidFormat(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = extract_text(dir.path().join("gone"), &ExtractConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn loading_twice_gives_equal_images() {
    let data = stamped_image(STAMP);
    let file = create_temp_file(&data);
    let config = ExtractConfig::default();

    let a = MachOImage::load(file.path(), &config).unwrap();
    let b = MachOImage::load(file.path(), &config).unwrap();
    assert_eq!(a, b);
    assert_eq!(SectionIndex::build(&a), SectionIndex::build(&b));
    assert_eq!(SectionIndex::build(&a).len(), a.sections().count());
}

#[test]
fn every_section_reads_back_its_file_range() {
    let data = stamped_image(STAMP);
    let file = create_temp_file(&data);
    let image = MachOImage::load(file.path(), &ExtractConfig::default()).unwrap();
    let reader = SectionReader::new(&image, u64::MAX);

    for (_, section) in image.sections() {
        let bytes = reader.read(&section.segment_name, &section.name).unwrap();
        let start = section.offset as usize;
        assert_eq!(bytes.len() as u64, section.size);
        assert_eq!(&bytes[..], &data[start..start + section.size as usize]);
    }
}

#[test]
fn raw_decoding_keeps_padding() {
    let data = stamped_image(STAMP);
    let file = create_temp_file(&data);
    let config = ExtractConfig {
        trim_trailing_nul: false,
        ..ExtractConfig::default()
    };
    assert_eq!(
        extract_text(file.path(), &config).unwrap(),
        "2024-07-20T10:00:00\0"
    );
}

#[test]
fn non_utf8_stamp_is_an_encoding_error() {
    let data = stamped_image(&[0xc3, 0x28, 0x00, 0x00]);
    let file = create_temp_file(&data);
    let err = extract_text(file.path(), &ExtractConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);

    // The raw bytes are still available
    let bytes = extract_section(file.path(), &ExtractConfig::default()).unwrap();
    assert_eq!(&bytes[..], &[0xc3, 0x28, 0x00, 0x00]);
}

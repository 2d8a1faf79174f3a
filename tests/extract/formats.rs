use crate::common::macho::{
    fat_binary, stamped_image, FixtureSection, FixtureSegment, MachOBuilder,
};
use crate::common::{create_temp_file, STAMP};
use embedded_resource::formats::macho::{Endianness, MachOClass};
use embedded_resource::{
    extract_text, CpuType, ExtractConfig, MachOError, MachOImage, ResourceError, SegmentedImage,
};

#[test]
fn all_word_sizes_and_byte_orders() {
    let layouts = [
        (MachOClass::MachO64, Endianness::Little, CpuType::X86_64),
        (MachOClass::MachO64, Endianness::Big, CpuType::PowerPC64),
        (MachOClass::MachO32, Endianness::Little, CpuType::X86),
        (MachOClass::MachO32, Endianness::Big, CpuType::PowerPC),
    ];
    for (class, endian, cpu) in layouts {
        let data = MachOBuilder::new()
            .class(class)
            .endian(endian)
            .cpu(cpu)
            .segment(FixtureSegment::new("__PAGEZERO"))
            .segment(
                FixtureSegment::new("__TEXT")
                    .section(FixtureSection::new("__text", 0x300, b"\x90\x90"))
                    .section(FixtureSection::new("myinfo", 0x400, STAMP)),
            )
            .build();
        let file = create_temp_file(&data);
        let image = MachOImage::load(file.path(), &ExtractConfig::default()).unwrap();
        assert_eq!(image.header().is_64(), class == MachOClass::MachO64, "{:?}", class);
        assert_eq!(image.header().endian, endian);
        assert_eq!(image.header().cpu(), cpu);
        assert_eq!(image.segments().len(), 2);

        assert_eq!(
            extract_text(file.path(), &ExtractConfig::default()).unwrap(),
            "2024-07-20T10:00:00",
            "{:?} {:?}",
            class,
            endian
        );
    }
}

#[test]
fn fat_binary_uses_requested_slice() {
    let intel = stamped_image(b"intel-build\0");
    let arm = stamped_image(b"arm-build\0");
    let data = fat_binary(&[(CpuType::X86_64, intel), (CpuType::Arm64, arm)]);
    let file = create_temp_file(&data);

    let arm_config = ExtractConfig {
        cpu: Some(CpuType::Arm64),
        ..ExtractConfig::default()
    };
    assert_eq!(extract_text(file.path(), &arm_config).unwrap(), "arm-build");

    let intel_config = ExtractConfig {
        cpu: Some(CpuType::X86_64),
        ..ExtractConfig::default()
    };
    assert_eq!(extract_text(file.path(), &intel_config).unwrap(), "intel-build");

    let image = MachOImage::load(file.path(), &arm_config).unwrap();
    let slice = image.slice().unwrap();
    assert_eq!(slice.cpu(), CpuType::Arm64);
    assert_eq!(image.file_len(), data.len() as u64);
    let (_, info) = image.sections().find(|(_, s)| s.name == "myinfo").unwrap();
    assert_eq!(info.offset, slice.offset + 4096);
}

#[test]
fn fat_binary_default_slice() {
    let intel = stamped_image(b"intel-build\0");
    let arm = stamped_image(b"arm-build\0");
    let data = fat_binary(&[(CpuType::X86_64, intel), (CpuType::Arm64, arm)]);
    let file = create_temp_file(&data);

    let expected = match CpuType::host() {
        Some(CpuType::Arm64) => "arm-build",
        _ => "intel-build",
    };
    assert_eq!(
        extract_text(file.path(), &ExtractConfig::default()).unwrap(),
        expected
    );
}

#[test]
fn fat_binary_without_requested_slice() {
    let intel = stamped_image(STAMP);
    let data = fat_binary(&[(CpuType::X86_64, intel)]);
    let file = create_temp_file(&data);
    let config = ExtractConfig {
        cpu: Some(CpuType::PowerPC),
        ..ExtractConfig::default()
    };

    let err = extract_text(file.path(), &config).unwrap_err();
    assert!(matches!(
        err,
        ResourceError::InvalidFormat(MachOError::NoMatchingSlice(CpuType::PowerPC))
    ));
}

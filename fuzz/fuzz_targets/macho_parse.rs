#![no_main]
use embedded_resource::{MachOImage, SectionIndex};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(image) = MachOImage::parse(data, "<fuzz>", None) {
        let index = SectionIndex::build(&image);
        let _ = index.lookup("__TEXT", "myinfo");
    }
});

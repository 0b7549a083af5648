#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use raster_convert::codecs::ico::ICON_FILE_LEN;
use raster_convert::{ConversionRequest, Converter, SourceLimits, TargetFormat};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct RequestSeed {
    format: u8,
    quality: u8,
    width: u8,
    height: u8,
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);
    let seed: RequestSeed = match RequestSeed::arbitrary(&mut unstructured) {
        Ok(s) => s,
        Err(_) => return,
    };
    let source = unstructured.take_rest().to_vec();
    let format = TargetFormat::ALL[seed.format as usize % TargetFormat::ALL.len()];

    let req = ConversionRequest::new(source, format)
        .with_quality(seed.quality)
        .with_size(seed.width as u32, seed.height as u32);

    // Cap decoded size so hostile headers cannot exhaust memory
    let converter = Converter::with_limits(SourceLimits::strict().with_max_pixels(4_000_000));
    if let Ok(out) = converter.convert(&req) {
        assert!(!out.is_empty());
        assert_eq!(out.media_type, format.mime_type());
        if format == TargetFormat::Ico {
            assert_eq!(out.len(), ICON_FILE_LEN);
        }
    }
});

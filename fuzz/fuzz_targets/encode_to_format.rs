#![no_main]

//! Fuzz target for the standard encoders and the icon builder.

use arbitrary::{Arbitrary, Unstructured};
use raster_convert::codecs::ico::{build_icon, ICON_FILE_LEN, ICON_SIZE};
use raster_convert::engine::{encode_standard, RasterSurface};
use raster_convert::TargetFormat;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct EncodeSeed {
    format: u8,
    quality: u8,
    width: u8,
    height: u8,
}

fn build_surface(data: &[u8], width: u32, height: u32) -> RasterSurface {
    let mut buffer = vec![0u8; (width * height * 4) as usize];
    for (i, byte) in buffer.iter_mut().enumerate() {
        *byte = data.get(i % data.len().max(1)).copied().unwrap_or(128);
    }
    RasterSurface::from_rgba(width, height, buffer).expect("buffer sized for surface")
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let mut unstructured = Unstructured::new(data);
    let seed: EncodeSeed = match EncodeSeed::arbitrary(&mut unstructured) {
        Ok(s) => s,
        Err(_) => return,
    };

    // Limit dimensions to avoid OOM (max 128x128)
    let w = (seed.width as u32 % 128).max(1);
    let h = (seed.height as u32 % 128).max(1);

    match TargetFormat::ALL[seed.format as usize % TargetFormat::ALL.len()] {
        TargetFormat::Ico => {
            let icon = build_icon(&build_surface(data, ICON_SIZE, ICON_SIZE));
            assert_eq!(icon.len(), ICON_FILE_LEN);
        }
        format => {
            // Encoding errors are fine; panics and empty outputs are not
            if let Ok(out) = encode_standard(&build_surface(data, w, h), format, seed.quality) {
                assert!(!out.is_empty());
            }
        }
    }
});

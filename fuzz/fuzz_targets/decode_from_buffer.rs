#![no_main]

use raster_convert::engine::{decode_image, rasterize};
use raster_convert::inspect;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = inspect(data);
    if let Ok((img, _)) = decode_image(data) {
        assert!(img.width() > 0 && img.height() > 0);
        let surface = rasterize(data, 0, 0).expect("decoded once, must rasterize again");
        assert_eq!(surface.dimensions(), (img.width(), img.height()));
    }
});

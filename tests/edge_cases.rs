// tests/edge_cases.rs
//
// Edge case tests for raster-convert
// Tests boundary values, invalid inputs, and error handling

use image::{DynamicImage, ImageFormat, RgbImage};
use raster_convert::engine::{
    check_dimensions, encode_jpeg, encode_png, encode_webp, rasterize, RasterSurface,
    MAX_DIMENSION, MAX_PIXELS,
};
use raster_convert::{
    convert, data_url, inspect, ConversionRequest, ConvertError, Converter, ErrorKind,
    SourceLimits, TargetFormat,
};
use std::io::Cursor;

// Helper function to create test images
fn create_test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

fn create_png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    create_test_image(width, height)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

mod minimal_image_tests {
    use super::*;

    #[test]
    fn test_1x1_upscale() {
        let surface = rasterize(&create_png(1, 1), 100, 100).unwrap();
        assert_eq!(surface.dimensions(), (100, 100));
        assert!(surface.is_opaque());
    }

    #[test]
    fn test_1x1_to_every_format() {
        let src = create_png(1, 1);
        for format in TargetFormat::ALL {
            let out = convert(&ConversionRequest::new(src.clone(), format)).unwrap();
            assert!(!out.is_empty(), "{format}");
        }
    }

    #[test]
    fn test_1x1_encoders() {
        let surface = RasterSurface::from_rgba(1, 1, vec![1, 2, 3, 4]).unwrap();
        assert!(encode_jpeg(&surface, 80).is_ok());
        assert!(encode_png(&surface).is_ok());
        assert!(encode_webp(&surface, 80).is_ok());
    }

    #[test]
    fn test_extreme_aspect_ratio() {
        let surface = rasterize(&create_png(300, 2), 1, 64).unwrap();
        assert_eq!(surface.pixels().len(), 64 * 4);
    }
}

mod dimension_tests {
    use super::*;

    #[test]
    fn test_half_specified_sizes_are_validation_errors() {
        for (w, h) in [(0, 10), (10, 0)] {
            let req = ConversionRequest::new(create_png(4, 4), TargetFormat::Png).with_size(w, h);
            let err = convert(&req).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
            assert!(err.is_recoverable());
        }
    }

    #[test]
    fn test_validation_happens_before_decode() {
        // Garbage source with a bad size still reports the size problem
        let req = ConversionRequest::new(vec![0u8; 4], TargetFormat::Jpeg).with_size(0, 5);
        assert_eq!(convert(&req).unwrap_err(), ConvertError::invalid_dimensions(0, 5));
    }

    #[test]
    fn test_target_above_max_dimension() {
        let req = ConversionRequest::new(create_png(4, 4), TargetFormat::Png)
            .with_size(MAX_DIMENSION + 1, 1);
        let err = convert(&req).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceLimit);
    }

    #[test]
    fn test_pixel_cap_boundary() {
        let side = (MAX_PIXELS as f64).sqrt() as u32;
        assert!(check_dimensions(side, side).is_ok());
        assert!(check_dimensions(side + 1, side + 1).is_err());
    }
}

mod quality_tests {
    use super::*;

    #[test]
    fn test_out_of_range_quality_is_clamped() {
        let src = create_png(16, 16);
        for quality in [0u8, 1, 100, 255] {
            let req = ConversionRequest::new(src.clone(), TargetFormat::Jpeg).with_quality(quality);
            assert!(convert(&req).is_ok(), "quality {quality}");
        }
        let clamped_low = ConversionRequest::new(src.clone(), TargetFormat::Jpeg).with_quality(0);
        let one = ConversionRequest::new(src, TargetFormat::Jpeg).with_quality(1);
        assert_eq!(convert(&clamped_low).unwrap(), convert(&one).unwrap());
    }

    #[test]
    fn test_quality_is_ignored_for_icons() {
        let src = create_png(16, 16);
        let a = convert(&ConversionRequest::new(src.clone(), TargetFormat::Ico).with_quality(5)).unwrap();
        let b = convert(&ConversionRequest::new(src, TargetFormat::Ico).with_quality(99)).unwrap();
        assert_eq!(a, b);
    }
}

mod invalid_input_tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        let err = convert(&ConversionRequest::new(Vec::new(), TargetFormat::Png)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_random_bytes() {
        let junk: Vec<u8> = (0..512u32).map(|i| (i * 31 % 251) as u8).collect();
        let err = convert(&ConversionRequest::new(junk, TargetFormat::Ico)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_truncated_png() {
        let src = create_png(40, 40);
        let req = ConversionRequest::new(src[..src.len() / 2].to_vec(), TargetFormat::Png);
        // A lenient decoder may recover a partial image; it must never panic
        if let Err(err) = convert(&req) {
            assert!(matches!(err.kind(), ErrorKind::Decode | ErrorKind::InternalBug));
        }
    }

    #[test]
    fn test_unknown_format_name() {
        let err = ConversionRequest::from_options(create_png(2, 2), "tiff", None, None, None)
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFormat { .. }));
        assert_eq!(err.kind().code(), "RASTER_VALIDATION_ERROR");
    }

    #[test]
    fn test_inspect_without_decode() {
        let meta = inspect(&create_png(1000, 3)).unwrap();
        assert_eq!((meta.width, meta.height), (1000, 3));
    }
}

mod data_url_edge_tests {
    use super::*;

    #[test]
    fn test_missing_comma_is_format_error() {
        let err = data_url::decode("data:image/png;base64").unwrap_err();
        assert_eq!(err, ConvertError::MissingDataUrlBody);
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_whitespace_around_input_is_ignored() {
        let payload = data_url::decode("  data:image/webp;base64,aGk=\n").unwrap();
        assert_eq!(payload.bytes, b"hi");
        assert_eq!(payload.media_type, "image/webp");
    }

    #[test]
    fn test_mime_with_parameters() {
        let url = data_url::encode(b"abc", Some("image/svg+xml;charset=utf-8"));
        let payload = data_url::decode(&url).unwrap();
        assert_eq!(payload.bytes, b"abc");
        assert_eq!(payload.media_type, "image/svg+xml");
    }
}

mod limits_tests {
    use super::*;

    #[test]
    fn test_strict_limits_pass_small_sources() {
        let converter = Converter::with_limits(SourceLimits::strict());
        assert!(converter
            .convert(&ConversionRequest::new(create_png(64, 64), TargetFormat::Ico))
            .is_ok());
    }

    #[test]
    fn test_byte_cap() {
        let src = create_png(64, 64);
        let converter = Converter::with_limits(SourceLimits::unbounded().with_max_bytes(10));
        let err = converter
            .convert(&ConversionRequest::new(src, TargetFormat::Png))
            .unwrap_err();
        assert!(matches!(err, ConvertError::SourceTooLarge { max: 10, .. }));
    }
}

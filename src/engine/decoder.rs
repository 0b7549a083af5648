// src/engine/decoder.rs
//
// Source decoding: magic-byte sniffing, then JPEG via mozjpeg, PNG via zune-png,
// still WebP via libwebp, anything else through the image crate.

use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::engine::{MAX_DIMENSION, MAX_PIXELS};
use crate::error::ConvertError;
use image::{
    DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, ImageReader, RgbImage, RgbaImage,
};
use mozjpeg::Decompress;
use std::io::Cursor;
use webp::{BitstreamFeatures, Decoder as WebPDecoder};
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_png::PngDecoder;

/// Decode JPEG using mozjpeg (backed by libjpeg-turbo)
pub fn decode_jpeg_mozjpeg(data: &[u8]) -> EngineResult<DynamicImage> {
    run_with_panic_policy("decode:mozjpeg", || {
        // libjpeg happily pads truncated streams with grey; treat them as corrupt
        if !data.windows(2).any(|pair| pair == [0xFF, 0xD9]) {
            return Err(ConvertError::decode_failed("jpeg: missing EOI marker"));
        }

        let decompress = Decompress::new_mem(data).map_err(|e| {
            ConvertError::decode_failed(format!("jpeg: decompress init failed: {e:?}"))
        })?;

        let mut decompress = decompress.rgb().map_err(|e| {
            ConvertError::decode_failed(format!("jpeg: rgb conversion failed: {e:?}"))
        })?;

        let width = decompress.width();
        let height = decompress.height();
        if width > MAX_DIMENSION as usize || height > MAX_DIMENSION as usize {
            return Err(ConvertError::dimension_exceeds_limit(
                width.max(height).min(u32::MAX as usize) as u32,
                MAX_DIMENSION,
            ));
        }
        let (width, height) = (width as u32, height as u32);
        check_dimensions(width, height)?;

        let pixels: Vec<[u8; 3]> = decompress.read_scanlines().map_err(|e| {
            ConvertError::decode_failed(format!("jpeg: failed to read scanlines: {e:?}"))
        })?;
        let flat: Vec<u8> = pixels.into_iter().flatten().collect();

        RgbImage::from_raw(width, height, flat)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| ConvertError::decode_failed("jpeg: scanline buffer size mismatch"))
    })
}

/// Decode PNG using zune-png. 16-bit input is stripped to 8-bit.
pub fn decode_png_zune(data: &[u8]) -> EngineResult<DynamicImage> {
    run_with_panic_policy("decode:png", || {
        let options = DecoderOptions::default().png_set_strip_to_8bit(true);
        let mut decoder = PngDecoder::new_with_options(zune_core::bytestream::ZCursor::new(data), options);
        let pixels = decoder
            .decode()
            .map_err(|e| ConvertError::decode_failed(format!("png: decode failed: {e}")))?;

        let info = decoder
            .info()
            .ok_or_else(|| ConvertError::decode_failed("png: missing header info"))?;
        let width = info.width as u32;
        let height = info.height as u32;
        check_dimensions(width, height)?;

        let buf = match pixels {
            zune_core::result::DecodingResult::U8(v) => v,
            _ => {
                return Err(ConvertError::decode_failed(
                    "png: unexpected non-U8 pixel buffer",
                ))
            }
        };

        let colorspace = decoder
            .colorspace()
            .ok_or_else(|| ConvertError::decode_failed("png: missing colorspace"))?;

        let built = match colorspace {
            ColorSpace::RGB => RgbImage::from_raw(width, height, buf).map(DynamicImage::ImageRgb8),
            ColorSpace::RGBA => {
                RgbaImage::from_raw(width, height, buf).map(DynamicImage::ImageRgba8)
            }
            ColorSpace::Luma => GrayImage::from_raw(width, height, buf).map(DynamicImage::ImageLuma8),
            ColorSpace::LumaA => {
                GrayAlphaImage::from_raw(width, height, buf).map(DynamicImage::ImageLumaA8)
            }
            other => {
                return Err(ConvertError::decode_failed(format!(
                    "png: unsupported colorspace {other:?}"
                )))
            }
        };
        built.ok_or_else(|| {
            ConvertError::decode_failed(format!("png: buffer does not match {colorspace:?} layout"))
        })
    })
}

/// Decode WebP using libwebp. Animated WebP falls back to the image crate.
pub fn decode_webp_libwebp(data: &[u8]) -> EngineResult<DynamicImage> {
    run_with_panic_policy("decode:webp", || {
        // Parse header first to avoid allocating huge buffers on malformed files
        let features = BitstreamFeatures::new(data).ok_or_else(|| {
            ConvertError::decode_failed("webp: failed to read bitstream features")
        })?;

        if features.has_animation() {
            return image::load_from_memory(data).map_err(|e| {
                ConvertError::decode_failed(format!("webp (animated): decode failed: {e}"))
            });
        }

        check_dimensions(features.width(), features.height())?;

        let decoded = WebPDecoder::new(data)
            .decode()
            .ok_or_else(|| ConvertError::decode_failed("webp: decode failed"))?;
        check_dimensions(decoded.width(), decoded.height())?;

        Ok(decoded.to_image())
    })
}

/// Decode any other format through the image crate.
pub fn decode_with_image_crate(data: &[u8]) -> EngineResult<DynamicImage> {
    run_with_panic_policy("decode:image", || {
        image::load_from_memory(data)
            .map_err(|e| ConvertError::decode_failed(format!("decode failed: {e}")))
    })
}

/// Detect input format using magic bytes. Returns None if unknown.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Unified decode entrypoint: sniff once, route by format, then re-check
/// the decoded dimensions.
pub fn decode_image(bytes: &[u8]) -> EngineResult<(DynamicImage, Option<ImageFormat>)> {
    if bytes.is_empty() {
        return Err(ConvertError::decode_failed("source is empty"));
    }

    let detected = detect_format(bytes);
    let img = match detected {
        Some(ImageFormat::Jpeg) => decode_jpeg_mozjpeg(bytes)?,
        Some(ImageFormat::Png) => decode_png_zune(bytes)?,
        Some(ImageFormat::WebP) => decode_webp_libwebp(bytes)?,
        _ => decode_with_image_crate(bytes)?,
    };

    check_dimensions(img.width(), img.height())?;
    if img.width() == 0 || img.height() == 0 {
        return Err(ConvertError::decode_failed("decoded image has zero area"));
    }

    tracing::debug!(
        format = ?detected,
        width = img.width(),
        height = img.height(),
        "decoded source"
    );
    Ok((img, detected))
}

/// Check if image dimensions are within safe limits.
/// Returns an error if the image is too large (potential decompression bomb).
pub fn check_dimensions(width: u32, height: u32) -> EngineResult<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ConvertError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(ConvertError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}

/// Read dimensions from the header only. `None` when the header is unreadable;
/// the full decode will report the real error.
pub fn read_header_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::{ImageFormat, Rgb, Rgba};

    fn encode_with_image_crate(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |_, _| Rgb([0, 0, 0]));
        encode_with_image_crate(DynamicImage::ImageRgb8(img), ImageFormat::Png)
    }

    fn encode_webp(width: u32, height: u32) -> Vec<u8> {
        let rgb: Vec<u8> = std::iter::repeat([10u8, 20u8, 30u8])
            .take((width * height) as usize)
            .flatten()
            .collect();
        webp::Encoder::from_rgb(&rgb, width, height)
            .encode_lossless()
            .to_vec()
    }

    #[test]
    fn test_check_dimensions_pixel_cap() {
        assert!(check_dimensions(10_000, 10_000).is_ok());
        let err = check_dimensions(20_000, 20_000).unwrap_err();
        assert!(matches!(err, ConvertError::PixelCountExceedsLimit { .. }));
    }

    #[test]
    fn test_detect_format_jpeg_and_png() {
        let png = encode_png(2, 2);
        let jpeg = encode_with_image_crate(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]))),
            ImageFormat::Jpeg,
        );
        assert_eq!(detect_format(&png), Some(ImageFormat::Png));
        assert_eq!(detect_format(&jpeg), Some(ImageFormat::Jpeg));
        assert_eq!(detect_format(b"not an image"), None);
    }

    #[test]
    fn test_decode_png_preserves_rgba_exactly() {
        let img = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 10, y as u8 * 20, 30, 128]));
        let png = encode_with_image_crate(DynamicImage::ImageRgba8(img.clone()), ImageFormat::Png);
        let (decoded, fmt) = decode_image(&png).unwrap();
        assert_eq!(fmt, Some(ImageFormat::Png));
        assert_eq!(decoded.to_rgba8(), img);
    }

    #[test]
    fn test_decode_jpeg_routes_to_mozjpeg() {
        let jpeg = encode_with_image_crate(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([9, 8, 7]))),
            ImageFormat::Jpeg,
        );
        let (img, fmt) = decode_image(&jpeg).unwrap();
        assert_eq!(fmt, Some(ImageFormat::Jpeg));
        assert_eq!((img.width(), img.height()), (2, 2));
    }

    #[test]
    fn test_decode_truncated_jpeg_fails() {
        let jpeg = encode_with_image_crate(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([9, 8, 7]))),
            ImageFormat::Jpeg,
        );
        let truncated = &jpeg[..jpeg.len() / 2];
        assert!(decode_image(truncated).is_err());
    }

    #[test]
    fn test_decode_webp_routes_to_libwebp() {
        let webp = encode_webp(3, 2);
        let (img, fmt) = decode_image(&webp).unwrap();
        assert_eq!(fmt, Some(ImageFormat::WebP));
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.to_rgb8().get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_decode_bmp_uses_image_crate() {
        let bmp = encode_with_image_crate(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([50, 60, 70]))),
            ImageFormat::Bmp,
        );
        let (img, fmt) = decode_image(&bmp).unwrap();
        assert_eq!(fmt, Some(ImageFormat::Bmp));
        assert_eq!(img.to_rgb8().get_pixel(3, 2).0, [50, 60, 70]);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = decode_image(b"definitely not pixels").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(decode_image(&[]).unwrap_err().kind(), ErrorKind::Decode);
    }
}

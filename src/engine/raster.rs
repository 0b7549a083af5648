// src/engine/raster.rs
//
// Pixel rasterizer: decoded source -> immutable RGBA surface at the requested size.

use crate::engine::common::EngineResult;
use crate::engine::decoder::{check_dimensions, decode_image};
use crate::error::ConvertError;
use fast_image_resize::{self as fir, ImageBufferError, MulDiv, PixelType, ResizeOptions};
use image::{imageops::FilterType, DynamicImage, RgbaImage};

const CHANNELS: usize = 4;

/// RGBA8 pixels, row-major, top row first.
///
/// `pixels.len() == width * height * 4` always holds; the fields are private
/// so the only ways to obtain a surface go through that check. Surfaces are
/// never mutated: resampling returns a new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterSurface {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> EngineResult<Self> {
        if width == 0 || height == 0 {
            return Err(ConvertError::invalid_dimensions(width, height));
        }
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(ConvertError::invalid_argument(
                "pixels",
                format!("{} bytes", pixels.len()),
                format!("expected {expected} bytes for {width}x{height} RGBA"),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_image(img: DynamicImage) -> EngineResult<Self> {
        let rgba = match img {
            DynamicImage::ImageRgba8(rgba) => rgba,
            other => other.to_rgba8(),
        };
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA at column `x`, row `y` (row 0 is the top).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    pub fn is_opaque(&self) -> bool {
        self.pixels.iter().skip(3).step_by(CHANNELS).all(|&a| a == 255)
    }

    /// View as an `image` buffer for the standard encoders.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// New surface of exactly `width` x `height`. Same size returns a copy.
    pub fn resample(&self, width: u32, height: u32) -> EngineResult<RasterSurface> {
        if width == 0 || height == 0 {
            return Err(ConvertError::invalid_dimensions(width, height));
        }
        check_dimensions(width, height)?;
        if (width, height) == self.dimensions() {
            return Ok(self.clone());
        }

        let pixels = fast_resize_rgba(self.width, self.height, &self.pixels, width, height)
            .map_err(|reason| {
                ConvertError::resize_failed(self.dimensions(), (width, height), reason)
            })?;
        tracing::trace!(
            from_width = self.width,
            from_height = self.height,
            width,
            height,
            "resampled surface"
        );
        RasterSurface::from_rgba(width, height, pixels)
    }
}

/// Decode `source_bytes` and produce a surface.
///
/// `0 x 0` keeps the native size; any other pair must be fully positive and
/// yields a surface of exactly that size (aspect ratio is not preserved).
pub fn rasterize(source_bytes: &[u8], width: u32, height: u32) -> EngineResult<RasterSurface> {
    validate_target(width, height)?;
    let (img, _format) = decode_image(source_bytes)?;
    rasterize_decoded(img, width, height)
}

/// Both-zero or both-positive. Says nothing about size limits.
pub fn validate_shape(width: u32, height: u32) -> EngineResult<()> {
    if (width == 0) != (height == 0) {
        return Err(ConvertError::invalid_dimensions(width, height));
    }
    Ok(())
}

/// Check a requested size before any decoding happens.
pub fn validate_target(width: u32, height: u32) -> EngineResult<()> {
    validate_shape(width, height)?;
    if width == 0 {
        return Ok(());
    }
    check_dimensions(width, height)
}

/// Second half of [`rasterize`] for callers that decoded the source themselves.
/// The size must already have passed [`validate_target`].
pub fn rasterize_decoded(img: DynamicImage, width: u32, height: u32) -> EngineResult<RasterSurface> {
    let native = RasterSurface::from_image(img)?;

    if (width, height) == (0, 0) || (width, height) == native.dimensions() {
        tracing::debug!(
            width = native.width,
            height = native.height,
            "rasterized at native size"
        );
        return Ok(native);
    }

    let surface = native.resample(width, height)?;
    tracing::debug!(
        source_width = native.width,
        source_height = native.height,
        width,
        height,
        "rasterized with resample"
    );
    Ok(surface)
}

/// Bilinear, the same kernel a 2D canvas uses when drawing a scaled image.
fn default_resize_options() -> ResizeOptions {
    ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Bilinear))
}

fn fast_resize_rgba(
    src_width: u32,
    src_height: u32,
    src_pixels: &[u8],
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<Vec<u8>, String> {
    let required_bytes = (src_width as usize)
        .checked_mul(src_height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or_else(|| "image buffer size overflow during resize".to_string())?;
    if src_pixels.len() < required_bytes {
        return Err(format!(
            "source buffer too small: expected {required_bytes} bytes, got {}",
            src_pixels.len()
        ));
    }

    let mut working = src_pixels[..required_bytes].to_vec();
    let primary = match fir::images::Image::from_slice_u8(
        src_width,
        src_height,
        working.as_mut_slice(),
        PixelType::U8x4,
    ) {
        Ok(src_image) => resize_with_source_image(src_image, dst_width, dst_height),
        Err(ImageBufferError::InvalidBufferAlignment) => {
            let mut aligned = fir::images::Image::new(src_width, src_height, PixelType::U8x4);
            aligned
                .buffer_mut()
                .copy_from_slice(&src_pixels[..required_bytes]);
            resize_with_source_image(aligned, dst_width, dst_height)
        }
        Err(other) => Err(format!("fir source image error: {other:?}")),
    };

    match primary {
        Ok(pixels) => Ok(pixels),
        Err(err) => {
            tracing::warn!(%err, "fast resize failed, falling back to image crate");
            resize_with_image_crate_fallback(
                src_pixels[..required_bytes].to_vec(),
                src_width,
                src_height,
                dst_width,
                dst_height,
            )
            .map_err(|fallback_err| format!("{err}; image crate fallback failed: {fallback_err}"))
        }
    }
}

fn resize_with_source_image(
    mut src_image: fir::images::Image<'_>,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<Vec<u8>, String> {
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, PixelType::U8x4);

    // Premultiply so transparent pixels don't bleed their colour into neighbours
    let opaque = src_image
        .buffer()
        .iter()
        .skip(3)
        .step_by(CHANNELS)
        .all(|&a| a == 255);

    let mul_div = MulDiv::default();
    if !opaque {
        mul_div
            .multiply_alpha_inplace(&mut src_image)
            .map_err(|e| format!("failed to premultiply alpha: {e}"))?;
    }

    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &default_resize_options())
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    if !opaque {
        mul_div
            .divide_alpha_inplace(&mut dst_image)
            .map_err(|e| format!("failed to unpremultiply alpha: {e}"))?;
    }

    Ok(dst_image.into_vec())
}

fn resize_with_image_crate_fallback(
    src_pixels: Vec<u8>,
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<Vec<u8>, String> {
    let rgba = RgbaImage::from_raw(src_width, src_height, src_pixels)
        .ok_or_else(|| "failed to build rgba image for fallback resize".to_string())?;
    Ok(image::imageops::resize(&rgba, dst_width, dst_height, FilterType::Triangle).into_raw())
}

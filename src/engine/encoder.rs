// src/engine/encoder.rs
//
// Standard encoders: JPEG (mozjpeg), PNG (image + oxipng), WebP (libwebp).
// The icon container has no library encoder; see codecs::ico.

use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::engine::raster::RasterSurface;
use crate::error::ConvertError;
use crate::ops::{EncodedOutput, TargetFormat};
use image::{DynamicImage, ImageFormat};
use mozjpeg::{ColorSpace, Compress, ScanMode};
use std::io::Cursor;

/// Single source of truth for deriving encoder knobs from a 1-100 quality.
///
/// Quality bands:
/// - High (>=85): favour visual quality
/// - Balanced (70-84)
/// - Fast (<70): favour size
#[derive(Debug, Clone, Copy)]
pub struct QualitySettings {
    quality: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QualityBand {
    High,
    Balanced,
    Fast,
}

impl QualitySettings {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100) as f32,
        }
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    fn band(&self) -> QualityBand {
        if self.quality >= 85.0 {
            QualityBand::High
        } else if self.quality >= 70.0 {
            QualityBand::Balanced
        } else {
            QualityBand::Fast
        }
    }

    pub fn jpeg_smoothing(&self) -> u8 {
        if self.quality >= 90.0 {
            0
        } else if self.quality >= 70.0 {
            5
        } else if self.quality >= 60.0 {
            10
        } else {
            18
        }
    }

    pub fn webp_sns_strength(&self) -> i32 {
        match self.band() {
            QualityBand::High => 50,
            QualityBand::Balanced => 70,
            QualityBand::Fast => 80,
        }
    }

    pub fn webp_filter_strength(&self) -> i32 {
        if self.quality >= 80.0 {
            20
        } else if self.quality >= 60.0 {
            30
        } else {
            40
        }
    }

    pub fn webp_filter_sharpness(&self) -> i32 {
        match self.band() {
            QualityBand::High => 2,
            QualityBand::Balanced | QualityBand::Fast => 0,
        }
    }
}

/// Route a surface to the standard encoder for `format`.
///
/// `quality` is ignored for PNG. An encoder that returns no bytes is an
/// `EncodeFailed` error, never an empty output.
pub fn encode_standard(
    surface: &RasterSurface,
    format: TargetFormat,
    quality: u8,
) -> EngineResult<EncodedOutput> {
    let bytes = match format {
        TargetFormat::Jpeg => encode_jpeg(surface, quality)?,
        TargetFormat::Png => encode_png(surface)?,
        TargetFormat::WebP => encode_webp(surface, quality)?,
        TargetFormat::Ico => {
            return Err(ConvertError::unsupported_format(
                "ico has no standard encoder; build it with codecs::ico",
            ))
        }
    };

    if bytes.is_empty() {
        return Err(ConvertError::encode_failed(
            format.as_str(),
            "encoder produced no data",
        ));
    }

    tracing::debug!(format = format.as_str(), bytes = bytes.len(), "encoded surface");
    Ok(EncodedOutput::new(bytes, format))
}

/// Encode to progressive JPEG using mozjpeg. Alpha is discarded.
pub fn encode_jpeg(surface: &RasterSurface, quality: u8) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:jpeg", || {
        let settings = QualitySettings::new(quality);
        let (w, h) = surface.dimensions();
        let rgb: Vec<u8> = surface
            .pixels()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();

        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(ColorSpace::JCS_YCbCr);
        comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);
        comp.set_optimize_scans(true);
        comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);
        // Sampling and scan setup reset the quant tables; quality goes last.
        comp.set_quality(settings.quality());
        comp.set_smoothing_factor(settings.jpeg_smoothing());

        let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);
        {
            let mut writer = comp.start_compress(&mut output).map_err(|e| {
                ConvertError::encode_failed("jpeg", format!("failed to start compress: {e:?}"))
            })?;

            let stride = w as usize * 3;
            for row in rgb.chunks(stride) {
                writer.write_scanlines(row).map_err(|e| {
                    ConvertError::encode_failed("jpeg", format!("failed to write scanlines: {e:?}"))
                })?;
            }

            writer.finish().map_err(|e| {
                ConvertError::encode_failed("jpeg", format!("failed to finish: {e:?}"))
            })?;
        }
        Ok(output)
    })
}

/// Encode to PNG with the image crate, then losslessly recompress with oxipng.
pub fn encode_png(surface: &RasterSurface) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:png", || {
        let rgba = surface
            .to_rgba_image()
            .ok_or_else(|| ConvertError::encode_failed("png", "surface buffer size mismatch"))?;

        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| ConvertError::encode_failed("png", format!("PNG encode failed: {e}")))?;

        let mut options = oxipng::Options::from_preset(4);
        options.strip = oxipng::StripChunks::None;

        oxipng::optimize_from_memory(&buf, &options).map_err(|e| {
            ConvertError::encode_failed("png", format!("oxipng optimization failed: {e}"))
        })
    })
}

/// Encode to lossy WebP. Opaque surfaces drop the alpha channel to save bytes.
pub fn encode_webp(surface: &RasterSurface, quality: u8) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:webp", || {
        let (w, h) = surface.dimensions();
        let settings = QualitySettings::new(quality);

        let rgb: Vec<u8>;
        let encoder = if surface.is_opaque() {
            rgb = surface
                .pixels()
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            webp::Encoder::from_rgb(&rgb, w, h)
        } else {
            webp::Encoder::from_rgba(surface.pixels(), w, h)
        };

        let mut config = webp::WebPConfig::new()
            .map_err(|_| ConvertError::internal_panic("failed to create WebPConfig"))?;
        config.quality = settings.quality();
        config.method = 4;
        config.pass = 1;
        config.preprocessing = 0;
        config.sns_strength = settings.webp_sns_strength();
        config.autofilter = 1;
        config.filter_strength = settings.webp_filter_strength();
        config.filter_sharpness = settings.webp_filter_sharpness();

        let mem = encoder.encode_advanced(&config).map_err(|e| {
            ConvertError::encode_failed("webp", format!("WebP encode failed: {e:?}"))
        })?;
        Ok(mem.to_vec())
    })
}

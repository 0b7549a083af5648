// lib.rs
//
// raster-convert: convert images between JPEG, PNG, WebP and a single-frame
// 64x64 ICO, with base64 / data-URL helpers.
//
// Design goals:
// - Stateless: every conversion is a pure function of its request
// - Typed failures, never partial output
// - Native codecs (mozjpeg, libwebp, zune-png, oxipng) behind one API

// Memory allocator optimization - jemalloc for better performance
// Note: jemalloc is not supported on Windows/MSVC, so we exclude it on that platform
#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

pub mod codecs;
pub mod engine;
pub mod error;
pub mod ops;

use image::ImageReader;
use std::io::Cursor;

pub use codecs::data_url::{self, DecodedPayload};
pub use engine::{
    convert, rasterize, ConversionMetrics, Converter, LimitPolicy, RasterSurface, SourceLimits,
};
pub use error::{ConvertError, ErrorKind, Result};
pub use ops::{ConversionRequest, EncodedOutput, PresetConfig, TargetFormat, DEFAULT_QUALITY};

/// Header-level facts about a source, read without decoding pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectMetadata {
    pub width: u32,
    pub height: u32,
    /// Lowercase container name, e.g. "png"; `None` when unrecognised
    pub format: Option<String>,
}

/// Read dimensions and container format from the header of `data`.
pub fn inspect(data: &[u8]) -> Result<InspectMetadata> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ConvertError::decode_failed(format!("failed to read image header: {e}")))?;

    let format = reader.format().map(|f| format!("{:?}", f).to_lowercase());
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ConvertError::decode_failed(format!("failed to read dimensions: {e}")))?;

    Ok(InspectMetadata {
        width,
        height,
        format,
    })
}

/// Convert a base64 or data-URL source and return the result as a data URL.
pub fn convert_data_url(text: &str, format: TargetFormat) -> Result<String> {
    let payload = data_url::decode(text)?;
    let output = convert(&ConversionRequest::new(payload.bytes, format))?;
    Ok(output.to_data_url())
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Source containers the decoder recognises
pub fn supported_input_formats() -> Vec<&'static str> {
    vec!["jpeg", "jpg", "png", "webp", "gif", "bmp"]
}

/// Names accepted by [`TargetFormat::from_name`]
pub fn supported_output_formats() -> Vec<&'static str> {
    vec!["jpeg", "jpg", "png", "webp", "ico"]
}

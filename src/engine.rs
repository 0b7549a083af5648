// src/engine.rs
//
// The core of raster-convert: decode a source once, rasterize it to an RGBA
// surface at the requested size, then encode that surface.
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
/// This is the same limit used by libvips/sharp.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod common;
mod convert;
mod decoder;
mod encoder;
mod limits;
mod pool;
mod raster;

pub use common::{run_with_panic_policy, EngineResult};
pub use convert::{convert, ConversionMetrics, Converter};
pub use decoder::{
    check_dimensions, decode_image, decode_jpeg_mozjpeg, decode_png_zune, decode_webp_libwebp,
    detect_format, read_header_dimensions,
};
pub use encoder::{encode_jpeg, encode_png, encode_standard, encode_webp, QualitySettings};
pub use limits::{LimitPolicy, SourceLimits};
pub use pool::{configured_threads, get_pool, MAX_CONCURRENCY};
pub use raster::{rasterize, rasterize_decoded, validate_shape, validate_target, RasterSurface};

// src/error.rs
//
// Unified error handling for raster-convert
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - Validation: malformed conversion request
// - Decode: source bytes are not a decodable image
// - Encode: a standard encoder produced nothing usable
// - Format: malformed base64 / data URL text
// - ResourceLimit: size caps on input bytes, dimensions, pixel counts
// - InternalBug: library bugs (should not happen)

use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy exposed to callers.
///
/// None of these are retried inside the engine. A conversion is a pure
/// function of its request, so callers may retry freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorKind {
    /// Impossible quality/dimension/format combination in the request
    Validation,
    /// Source bytes could not be decoded
    Decode,
    /// Standard encoder failed or produced no data
    Encode,
    /// Malformed base64 body or data URL
    Format,
    /// Input exceeded a configured or global size cap
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Decode => "DecodeError",
            ErrorKind::Encode => "EncodeError",
            ErrorKind::Format => "FormatError",
            ErrorKind::ResourceLimit => "ResourceLimit",
            ErrorKind::InternalBug => "InternalBug",
        }
    }

    /// Stable machine-readable code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "RASTER_VALIDATION_ERROR",
            ErrorKind::Decode => "RASTER_DECODE_ERROR",
            ErrorKind::Encode => "RASTER_ENCODE_ERROR",
            ErrorKind::Format => "RASTER_FORMAT_ERROR",
            ErrorKind::ResourceLimit => "RASTER_RESOURCE_LIMIT",
            ErrorKind::InternalBug => "RASTER_INTERNAL_BUG",
        }
    }
}

/// raster-convert error types
///
/// A failure never carries partial output: callers get either a complete
/// `EncodedOutput` or one of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConvertError {
    // Validation Errors
    #[error("Unsupported output format: '{format}'. Expected jpeg, jpg, png, webp, or ico")]
    UnsupportedFormat { format: Cow<'static, str> },

    #[error("Invalid target dimensions: width={width}, height={height}. Both must be zero (native size) or both positive")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Unknown preset: '{name}'. Available: thumbnail, avatar, favicon, social")]
    InvalidPreset { name: Cow<'static, str> },

    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    // Decode Errors
    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("Resize failed ({source_width}x{source_height} -> {target_width}x{target_height}): {message}")]
    ResizeFailed {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        message: Cow<'static, str>,
    },

    // Encode Errors
    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    // Format Errors
    #[error("Malformed base64 payload: {message}")]
    MalformedBase64 { message: Cow<'static, str> },

    #[error("Data URL has no base64 body")]
    MissingDataUrlBody,

    // Size Limit Errors
    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    #[error("Source size {len} bytes exceeds limit of {max} bytes")]
    SourceTooLarge { len: u64, max: u64 },

    // Internal Errors
    #[error("Internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },
}

// Constructor Helpers
impl ConvertError {
    pub fn unsupported_format(format: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn invalid_dimensions(width: u32, height: u32) -> Self {
        Self::InvalidDimensions { width, height }
    }

    pub fn invalid_preset(name: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidPreset { name: name.into() }
    }

    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(
        source_dims: (u32, u32),
        target_dims: (u32, u32),
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResizeFailed {
            source_width: source_dims.0,
            source_height: source_dims.1,
            target_width: target_dims.0,
            target_height: target_dims.1,
            message: message.into(),
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn malformed_base64(message: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedBase64 {
            message: message.into(),
        }
    }

    pub fn missing_data_url_body() -> Self {
        Self::MissingDataUrlBody
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn source_too_large(len: u64, max: u64) -> Self {
        Self::SourceTooLarge { len, max }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (caller can fix the input)
    ///
    /// Consistent with kind():
    /// - Validation, Format and ResourceLimit errors are recoverable
    /// - Decode, Encode and InternalBug errors are not
    pub fn is_recoverable(&self) -> bool {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Format | ErrorKind::ResourceLimit => true,
            ErrorKind::Decode | ErrorKind::Encode | ErrorKind::InternalBug => false,
        }
    }

    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat { .. }
            | Self::InvalidDimensions { .. }
            | Self::InvalidPreset { .. }
            | Self::InvalidArgument { .. } => ErrorKind::Validation,

            // ResizeFailed happens while producing the raster surface, so it
            // is reported alongside decode failures.
            Self::DecodeFailed { .. } | Self::ResizeFailed { .. } => ErrorKind::Decode,

            Self::EncodeFailed { .. } => ErrorKind::Encode,

            Self::MalformedBase64 { .. } | Self::MissingDataUrlBody => ErrorKind::Format,

            Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. }
            | Self::SourceTooLarge { .. } => ErrorKind::ResourceLimit,

            Self::InternalPanic { .. } => ErrorKind::InternalBug,
        }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, ConvertError>;

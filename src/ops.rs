// src/ops.rs
//
// Conversion request and output types.
// These are cheap to create and store - the expensive work happens in convert().

use crate::codecs::{data_url, ico};
use crate::error::{ConvertError, Result};

/// Default quality used when a request does not specify one.
pub const DEFAULT_QUALITY: u8 = 80;

/// Output container for a conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    Jpeg,
    Png,
    WebP,
    /// Single-frame 64x64 32-bit icon, assembled by hand
    Ico,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 4] = [
        TargetFormat::Jpeg,
        TargetFormat::Png,
        TargetFormat::WebP,
        TargetFormat::Ico,
    ];

    /// Parse a format name. Accepts `jpg` as an alias for `jpeg`; case-insensitive.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            "ico" => Ok(Self::Ico),
            other => Err(ConvertError::unsupported_format(other.to_string())),
        }
    }

    /// Canonical MIME string
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Ico => ico::ICON_MEDIA_TYPE,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Ico => "ico",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Ico => "ico",
        }
    }

    /// Whether `quality` influences the output
    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::Jpeg | Self::WebP)
    }
}

impl std::str::FromStr for TargetFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversion: source bytes plus the options record
/// `{format, quality, width, height}`.
///
/// Width and height are both zero (keep native size) or both positive.
/// That invariant is checked by the orchestrator, not here, so a request can
/// be built from untrusted options and rejected with a typed error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source_bytes: Vec<u8>,
    pub target_format: TargetFormat,
    pub quality: u8,
    pub target_width: u32,
    pub target_height: u32,
}

impl ConversionRequest {
    pub fn new(source_bytes: impl Into<Vec<u8>>, target_format: TargetFormat) -> Self {
        Self {
            source_bytes: source_bytes.into(),
            target_format,
            quality: DEFAULT_QUALITY,
            target_width: 0,
            target_height: 0,
        }
    }

    /// Build from loosely-typed options, the way a UI form hands them over.
    /// Missing values fall back to `quality=80, width=0, height=0`.
    pub fn from_options(
        source_bytes: impl Into<Vec<u8>>,
        format: &str,
        quality: Option<u8>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Self> {
        let target_format = TargetFormat::from_name(format)?;
        Ok(Self {
            source_bytes: source_bytes.into(),
            target_format,
            quality: quality.unwrap_or(DEFAULT_QUALITY),
            target_width: width.unwrap_or(0),
            target_height: height.unwrap_or(0),
        })
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.target_width = width;
        self.target_height = height;
        self
    }

    /// Quality clamped into 1..=100
    pub fn effective_quality(&self) -> u8 {
        self.quality.clamp(1, 100)
    }
}

/// Finished conversion. Owned by the caller; never partially filled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedOutput {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub format: TargetFormat,
}

impl EncodedOutput {
    pub fn new(bytes: Vec<u8>, format: TargetFormat) -> Self {
        Self {
            bytes,
            media_type: format.mime_type(),
            format,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// `stem` plus the format's extension, e.g. `logo` -> `logo.ico`
    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.format.extension())
    }

    /// `data:<media type>;base64,<body>`
    pub fn to_data_url(&self) -> String {
        data_url::encode(&self.bytes, Some(self.media_type))
    }
}

// =============================================================================
// PRESETS - Common configurations for web image conversion
// =============================================================================

/// Preset configuration for common use cases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresetConfig {
    /// Target width (0 = native)
    pub width: u32,
    /// Target height (0 = native)
    pub height: u32,
    pub format: TargetFormat,
    pub quality: u8,
}

impl PresetConfig {
    pub fn new(width: u32, height: u32, format: TargetFormat, quality: u8) -> Self {
        Self {
            width,
            height,
            format,
            quality,
        }
    }

    /// Get the built-in preset by name
    pub fn get(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "thumbnail" => Ok(Self::thumbnail()),
            "avatar" => Ok(Self::avatar()),
            "favicon" => Ok(Self::favicon()),
            "social" => Ok(Self::social()),
            other => Err(ConvertError::invalid_preset(other.to_string())),
        }
    }

    /// Thumbnail preset: 150x150, WebP quality 75
    pub fn thumbnail() -> Self {
        Self::new(150, 150, TargetFormat::WebP, 75)
    }

    /// Avatar preset: 200x200, WebP quality 80
    pub fn avatar() -> Self {
        Self::new(200, 200, TargetFormat::WebP, 80)
    }

    /// Favicon preset: the fixed 64x64 icon container
    pub fn favicon() -> Self {
        Self::new(64, 64, TargetFormat::Ico, DEFAULT_QUALITY)
    }

    /// Social preset: 1200x630, JPEG quality 80
    /// Use case: OGP/Twitter Card images
    pub fn social() -> Self {
        Self::new(1200, 630, TargetFormat::Jpeg, 80)
    }

    pub fn to_request(&self, source_bytes: impl Into<Vec<u8>>) -> ConversionRequest {
        ConversionRequest::new(source_bytes, self.format)
            .with_quality(self.quality)
            .with_size(self.width, self.height)
    }
}

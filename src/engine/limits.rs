// src/engine/limits.rs
//
// Per-converter caps on untrusted sources, checked before the expensive decode.
// The global MAX_DIMENSION / MAX_PIXELS caps always apply on top of these.

use crate::engine::common::EngineResult;
use crate::engine::decoder::read_header_dimensions;
use crate::error::ConvertError;

const STRICT_MAX_PIXELS: u64 = 40_000_000; // ~8K x 5K
const LENIENT_MAX_PIXELS: u64 = 75_000_000; // below global MAX_PIXELS
const STRICT_MAX_BYTES: u64 = 32 * 1024 * 1024;
const LENIENT_MAX_BYTES: u64 = 48 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitPolicy {
    Unbounded,
    Strict,
    Lenient,
    Custom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLimits {
    pub policy: LimitPolicy,
    pub max_bytes: Option<u64>,
    pub max_pixels: Option<u64>,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl SourceLimits {
    /// Only the global caps apply
    pub fn unbounded() -> Self {
        Self {
            policy: LimitPolicy::Unbounded,
            max_bytes: None,
            max_pixels: None,
        }
    }

    /// For sources straight from the network
    pub fn strict() -> Self {
        Self {
            policy: LimitPolicy::Strict,
            max_bytes: Some(STRICT_MAX_BYTES),
            max_pixels: Some(STRICT_MAX_PIXELS),
        }
    }

    pub fn lenient() -> Self {
        Self {
            policy: LimitPolicy::Lenient,
            max_bytes: Some(LENIENT_MAX_BYTES),
            max_pixels: Some(LENIENT_MAX_PIXELS),
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self.policy = LimitPolicy::Custom;
        self
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = Some(max_pixels);
        self.policy = LimitPolicy::Custom;
        self
    }

    pub fn enforce_source_len(&self, len: usize) -> EngineResult<()> {
        if let Some(limit) = self.max_bytes {
            let len = len as u64;
            if len > limit {
                return Err(ConvertError::source_too_large(len, limit));
            }
        }
        Ok(())
    }

    pub fn enforce_pixels(&self, width: u32, height: u32) -> EngineResult<()> {
        if let Some(limit) = self.max_pixels {
            let pixels = width as u64 * height as u64;
            if pixels > limit {
                return Err(ConvertError::pixel_count_exceeds_limit(pixels, limit));
            }
        }
        Ok(())
    }

    /// Byte cap, then the pixel cap against the header-declared size.
    /// An unreadable header passes; the decoder reports the real problem.
    pub fn enforce_source(&self, bytes: &[u8]) -> EngineResult<()> {
        self.enforce_source_len(bytes.len())?;
        if self.max_pixels.is_some() {
            if let Some((width, height)) = read_header_dimensions(bytes) {
                self.enforce_pixels(width, height)?;
            }
        }
        Ok(())
    }
}

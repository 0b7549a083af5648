// src/engine/convert.rs
//
// Conversion orchestrator: validate -> decode -> rasterize -> encode.
// Every request is independent; a converter holds only its source limits.

use crate::codecs::ico::{build_icon, ICON_SIZE};
use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::engine::decoder::decode_image;
use crate::engine::encoder::encode_standard;
use crate::engine::limits::SourceLimits;
use crate::engine::pool;
use crate::engine::raster::{rasterize_decoded, validate_shape, validate_target};
use crate::ops::{ConversionRequest, EncodedOutput, TargetFormat};
use image::ImageFormat;
use rayon::prelude::*;
use std::time::Instant;

/// Timing and size figures for one conversion. Times are wall-clock milliseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConversionMetrics {
    pub decode_ms: f64,
    pub raster_ms: f64,
    pub encode_ms: f64,
    pub total_ms: f64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    /// `bytes_out / bytes_in`, 0.0 for an empty source
    pub compression_ratio: f64,
    /// Sniffed source container, e.g. "png"; "unknown" when sniffing failed
    pub format_in: String,
    pub format_out: String,
}

fn source_format_name(format: Option<ImageFormat>) -> String {
    match format {
        Some(ImageFormat::Jpeg) => "jpeg",
        Some(ImageFormat::Png) => "png",
        Some(ImageFormat::WebP) => "webp",
        Some(ImageFormat::Gif) => "gif",
        Some(ImageFormat::Bmp) => "bmp",
        Some(ImageFormat::Ico) => "ico",
        Some(other) => other.to_mime_type(),
        None => "unknown",
    }
    .to_string()
}

/// Measures validate+decode -> rasterize -> encode and fills the metrics in one place.
struct MetricsRecorder {
    start_total: Instant,
    stage_start: Instant,
    metrics: ConversionMetrics,
}

impl MetricsRecorder {
    fn new(input_size: usize) -> Self {
        let now = Instant::now();
        Self {
            start_total: now,
            stage_start: now,
            metrics: ConversionMetrics {
                bytes_in: input_size as u64,
                ..ConversionMetrics::default()
            },
        }
    }

    fn lap(&mut self) -> f64 {
        let ms = self.stage_start.elapsed().as_secs_f64() * 1000.0;
        self.stage_start = Instant::now();
        ms
    }

    fn mark_decode_done(&mut self, format: Option<ImageFormat>) {
        self.metrics.decode_ms = self.lap();
        self.metrics.format_in = source_format_name(format);
    }

    fn mark_raster_done(&mut self) {
        self.metrics.raster_ms = self.lap();
    }

    fn finalize(mut self, output: &EncodedOutput) -> ConversionMetrics {
        self.metrics.encode_ms = self.lap();
        self.metrics.total_ms = self.start_total.elapsed().as_secs_f64() * 1000.0;
        self.metrics.bytes_out = output.len() as u64;
        self.metrics.compression_ratio = if self.metrics.bytes_in > 0 {
            self.metrics.bytes_out as f64 / self.metrics.bytes_in as f64
        } else {
            0.0
        };
        self.metrics.format_out = output.format.as_str().to_string();
        self.metrics
    }
}

/// Runs conversions under a fixed set of [`SourceLimits`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Converter {
    limits: SourceLimits,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: SourceLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SourceLimits {
        &self.limits
    }

    /// Convert one request. On failure no partial output is produced.
    pub fn convert(&self, request: &ConversionRequest) -> EngineResult<EncodedOutput> {
        self.convert_with_metrics(request).map(|(output, _)| output)
    }

    pub fn convert_with_metrics(
        &self,
        request: &ConversionRequest,
    ) -> EngineResult<(EncodedOutput, ConversionMetrics)> {
        let format = request.target_format;
        let quality = request.effective_quality();

        // Icons ignore the requested size, so only its shape is checked.
        let (width, height) = match format {
            TargetFormat::Ico => {
                validate_shape(request.target_width, request.target_height)?;
                (ICON_SIZE, ICON_SIZE)
            }
            _ => {
                validate_target(request.target_width, request.target_height)?;
                (request.target_width, request.target_height)
            }
        };

        self.limits.enforce_source(&request.source_bytes)?;

        let mut recorder = MetricsRecorder::new(request.source_bytes.len());
        let (img, detected) = decode_image(&request.source_bytes)?;
        self.limits.enforce_pixels(img.width(), img.height())?;
        recorder.mark_decode_done(detected);

        let surface = rasterize_decoded(img, width, height)?;
        recorder.mark_raster_done();

        let output = match format {
            TargetFormat::Ico => {
                let bytes = run_with_panic_policy("encode:ico", || Ok(build_icon(&surface)))?;
                EncodedOutput::new(bytes, TargetFormat::Ico)
            }
            _ => encode_standard(&surface, format, quality)?,
        };
        let metrics = recorder.finalize(&output);

        tracing::debug!(
            format_in = %metrics.format_in,
            format_out = %metrics.format_out,
            width,
            height,
            quality,
            bytes_in = metrics.bytes_in,
            bytes_out = metrics.bytes_out,
            total_ms = metrics.total_ms,
            "conversion finished"
        );
        Ok((output, metrics))
    }

    /// Convert every request on the shared batch pool. Results keep the input
    /// order and one failure does not affect the others.
    pub fn convert_batch(&self, requests: &[ConversionRequest]) -> Vec<EngineResult<EncodedOutput>> {
        let run = || {
            requests
                .par_iter()
                .map(|request| self.convert(request))
                .collect::<Vec<_>>()
        };
        let results = match pool::get_pool() {
            Some(pool) => pool.install(run),
            None => run(),
        };

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::warn!(total = results.len(), failed, "batch finished with failures");
        }
        results
    }
}

/// Convert with the default, unbounded limits.
pub fn convert(request: &ConversionRequest) -> EngineResult<EncodedOutput> {
    Converter::default().convert(request)
}

//! Thumbnail normalizer - turns an uploaded poster into the canonical thumbnail
//!
//! The upload is scaled to fit inside a square, centred on a white canvas
//! (letterboxed, never cropped) and encoded as JPEG. Decoding and encoding are
//! CPU-bound and run on the blocking thread pool.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use domains::{DomainError, ImageProcessor, Result, THUMBNAIL_EDGE};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Limits, Rgba, RgbaImage, RgbImage};
use tracing::debug;

/// Largest width or height accepted from an upload or a cached entry.
pub const MAX_SOURCE_DIMENSION: u32 = 8192;

#[derive(Debug, Clone, Copy)]
pub struct ThumbnailNormalizer {
    /// Width and height of the output, in pixels
    edge: u32,
    /// JPEG quality (1-100)
    quality: u8,
    /// Images declaring a larger width or height are refused before decoding
    max_dimension: u32,
}

impl Default for ThumbnailNormalizer {
    fn default() -> Self {
        Self {
            edge: THUMBNAIL_EDGE,
            quality: 90,
            max_dimension: MAX_SOURCE_DIMENSION,
        }
    }
}

impl ThumbnailNormalizer {
    pub fn new(edge: u32, quality: u8) -> Self {
        Self {
            edge: edge.max(1),
            quality: quality.clamp(1, 100),
            max_dimension: MAX_SOURCE_DIMENSION,
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }

    fn decode(&self, raw: &[u8]) -> std::result::Result<DynamicImage, String> {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);

        let mut reader = ImageReader::new(Cursor::new(raw))
            .with_guessed_format()
            .map_err(|e| e.to_string())?;
        reader.limits(limits);
        reader.decode().map_err(|e| e.to_string())
    }

    /// Blocking version of [`ImageProcessor::normalize`].
    pub fn normalize_blocking(&self, raw: &[u8]) -> Result<Bytes> {
        let img = self
            .decode(raw)
            .map_err(|e| DomainError::image(format!("failed to decode upload: {e}")))?;

        let fitted = img.resize(self.edge, self.edge, FilterType::Lanczos3).to_rgba8();
        let x = (self.edge - fitted.width()) / 2;
        let y = (self.edge - fitted.height()) / 2;
        debug!(
            original_width = img.width(),
            original_height = img.height(),
            fitted_width = fitted.width(),
            fitted_height = fitted.height(),
            "normalizing thumbnail"
        );

        let mut canvas = RgbaImage::from_pixel(self.edge, self.edge, Rgba([255, 255, 255, 255]));
        imageops::overlay(&mut canvas, &fitted, i64::from(x), i64::from(y));

        self.encode(&DynamicImage::ImageRgba8(canvas).to_rgb8())
    }

    /// Blocking version of [`ImageProcessor::to_jpeg`].
    pub fn to_jpeg_blocking(&self, stored: &[u8]) -> Result<Bytes> {
        let img = self
            .decode(stored)
            .map_err(|e| DomainError::image(format!("failed to decode cached image: {e}")))?;
        self.encode(&img.to_rgb8())
    }

    fn encode(&self, rgb: &RgbImage) -> Result<Bytes> {
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.quality)
            .encode_image(rgb)
            .map_err(|e| DomainError::image(format!("failed to encode JPEG: {e}")))?;
        Ok(Bytes::from(buf))
    }
}

#[async_trait]
impl ImageProcessor for ThumbnailNormalizer {
    async fn normalize(&self, raw: Bytes) -> Result<Bytes> {
        let this = *self;
        tokio::task::spawn_blocking(move || this.normalize_blocking(&raw))
            .await
            .map_err(|e| DomainError::Internal(format!("thumbnail task panicked: {e}")))?
    }

    async fn to_jpeg(&self, stored: Bytes) -> Result<Bytes> {
        let this = *self;
        tokio::task::spawn_blocking(move || this.to_jpeg_blocking(&stored))
            .await
            .map_err(|e| DomainError::Internal(format!("re-encode task panicked: {e}")))?
    }
}

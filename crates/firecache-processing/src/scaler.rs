//! Bounding-box scaler
//!
//! Decodes a cached asset, shrinks it to fit the requested box and re-encodes
//! it as PNG. The cached original is never modified.

use crate::size::ScaleSize;
use bytes::Bytes;
use firecache_core::{AppError, CacheEntry};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Content type of every scaled image.
pub const OUTPUT_CONTENT_TYPE: &str = "image/png";

/// Result of a scale attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleOutcome {
    /// Re-encoded image fitting the requested box.
    Scaled(CacheEntry),
    /// The content is not a decodable image; serve the original unchanged.
    NotAnImage,
}

impl ScaleOutcome {
    /// The entry to serve: the scaled image, or `original` for non-images.
    pub fn into_entry(self, original: CacheEntry) -> CacheEntry {
        match self {
            ScaleOutcome::Scaled(entry) => entry,
            ScaleOutcome::NotAnImage => original,
        }
    }
}

pub struct ImageScaler;

impl ImageScaler {
    /// Fit `entry` inside `size`, preserving aspect ratio and never upscaling.
    ///
    /// CPU bound: run it on a blocking thread.
    pub fn scale(entry: &CacheEntry, size: ScaleSize) -> Result<ScaleOutcome, AppError> {
        let img = match Self::decode(&entry.content) {
            Ok(img) => img,
            Err(e) => {
                tracing::debug!(
                    content_type = %entry.content_type,
                    size_bytes = entry.len(),
                    error = %e,
                    "Content is not a decodable image, passing through"
                );
                return Ok(ScaleOutcome::NotAnImage);
            }
        };

        let (width, height) = img.dimensions();
        let resized = if width <= size.width && height <= size.height {
            img
        } else {
            img.resize(size.width, size.height, FilterType::Lanczos3)
        };

        let (out_width, out_height) = resized.dimensions();
        tracing::debug!(
            original_width = width,
            original_height = height,
            width = out_width,
            height = out_height,
            bounds = %size,
            "Scaled image"
        );

        let data = Self::encode_png(resized)?;
        Ok(ScaleOutcome::Scaled(CacheEntry::new(OUTPUT_CONTENT_TYPE, data)))
    }

    fn decode(data: &[u8]) -> Result<DynamicImage, image::ImageError> {
        let cursor = Cursor::new(data);
        image::ImageReader::new(cursor)
            .with_guessed_format()?
            .decode()
    }

    fn encode_png(img: DynamicImage) -> Result<Bytes, AppError> {
        // PNG has no floating point pixel layouts.
        let img = match img {
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                DynamicImage::ImageRgba8(img.to_rgba8())
            }
            other => other,
        };

        let (width, height) = img.dimensions();
        let mut buffer = Vec::with_capacity(width as usize * height as usize * 3);
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| AppError::ImageProcessing(format!("Failed to encode PNG: {}", e)))?;

        Ok(Bytes::from(buffer))
    }
}

use image::{DynamicImage, RgbImage};
use log::{debug, info};

use super::jpeg::encode_jpeg;
use crate::error::StageError;
use crate::processing::normalize::FormatConverter;

/// Decode a HEIC/HEIF payload into an RGB bitmap with libheif
pub fn decode_heif(data: &[u8]) -> Result<DynamicImage, StageError> {
    let heic_error = |msg: String| StageError::Normalize(msg);

    let ctx = libheif_rs::HeifContext::read_from_bytes(data)
        .map_err(|e| heic_error(format!("Failed to read HEIC: {}", e)))?;

    let handle = ctx
        .primary_image_handle()
        .map_err(|e| heic_error(format!("Failed to get HEIC handle: {}", e)))?;

    let heif_img = handle
        .decode(
            libheif_rs::ColorSpace::Rgb(libheif_rs::RgbChroma::Rgb),
            None,
        )
        .map_err(|e| heic_error(format!("Failed to decode HEIC: {}", e)))?;

    let width = heif_img.width();
    let height = heif_img.height();

    let plane = heif_img
        .planes()
        .interleaved
        .ok_or_else(|| heic_error("HEIC image doesn't have interleaved data".to_string()))?;

    // Rows may be padded past width * 3
    let row_bytes = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in plane.data.chunks(plane.stride).take(height as usize) {
        if row.len() < row_bytes {
            return Err(heic_error("Truncated HEIC plane".to_string()));
        }
        pixels.extend_from_slice(&row[..row_bytes]);
    }

    let img = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| heic_error("Failed to create RGB image from HEIC data".to_string()))?;

    debug!("Decoded HEIC image {}x{}", width, height);
    Ok(DynamicImage::ImageRgb8(img))
}

/// Converts HEIC/HEIF uploads to JPEG using libheif
#[derive(Debug, Clone, Copy)]
pub struct HeifConverter {
    quality: u8,
}

impl HeifConverter {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }
}

impl FormatConverter for HeifConverter {
    fn convert(&self, data: &[u8]) -> Result<Vec<u8>, StageError> {
        let img = decode_heif(data)?;
        let jpeg = encode_jpeg(&img, self.quality)
            .map_err(|e| StageError::Normalize(format!("Failed to encode JPEG: {}", e)))?;
        info!(
            "Converted HEIC ({} bytes) to JPEG ({} bytes, quality {})",
            data.len(),
            jpeg.len(),
            self.quality
        );
        Ok(jpeg)
    }
}

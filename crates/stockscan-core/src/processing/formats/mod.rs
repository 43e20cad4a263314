// Format-specific modules
pub mod heic;
pub mod jpeg;

// Re-export format-specific functions for external use
pub use heic::{decode_heif, HeifConverter};
pub use jpeg::encode_jpeg;

use image::DynamicImage;

use crate::error::StageError;

/// Render an encoded payload into a pixel bitmap using the raster layer
pub fn load_bitmap(data: &[u8]) -> Result<DynamicImage, StageError> {
    image::load_from_memory(data).map_err(|e| StageError::Preprocess(e.to_string()))
}

//! Barcode reading capabilities.
//!
//! The pipeline never decodes bars itself. It drives two collaborators:
//! a [`BarcodeReader`] that scans an encoded image, and an optional
//! [`FastDetector`] that is tried once on the unprocessed bitmap.

use image::DynamicImage;

use crate::error::StageError;
use crate::types::{DecodedBarcode, Symbology};

mod rxing_reader;

pub use rxing_reader::{RxingDetector, RxingReader};

/// Scans an encoded image for one barcode
pub trait BarcodeReader {
    /// Returns `StageError::NotFound` when the image holds no readable code
    fn scan(&self, payload: &[u8]) -> Result<DecodedBarcode, StageError>;
}

/// One value reported by a fast-path detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub raw_value: String,
    pub symbology: Option<Symbology>,
}

/// Locates and decodes barcodes in a bitmap without custom preprocessing
pub trait FastDetector {
    fn detect(&self, bitmap: &DynamicImage) -> Result<Vec<Detection>, StageError>;
}

/// Run the detector and keep the first value with non-blank text.
/// `Ok(None)` means nothing was found, which is not a failure.
pub fn try_fast_detect(
    detector: &dyn FastDetector,
    bitmap: &DynamicImage,
) -> Result<Option<DecodedBarcode>, StageError> {
    let detections = detector.detect(bitmap)?;
    Ok(detections
        .into_iter()
        .find_map(|d| DecodedBarcode::new(d.raw_value, d.symbology)))
}

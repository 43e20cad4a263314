//! Format normalization.
//!
//! Converts encodings the raster layer cannot render (HEIC/HEIF) into JPEG.
//! Everything else passes through untouched, borrowed rather than copied.

use std::borrow::Cow;
use std::path::Path;

use log::debug;

use crate::error::StageError;
use crate::types::{MediaFormat, SourceImage};

/// Converts a HEIF payload into a universally decodable raster encoding
pub trait FormatConverter {
    fn convert(&self, data: &[u8]) -> Result<Vec<u8>, StageError>;
}

/// Returns the input unchanged unless it is HEIC/HEIF, in which case it is
/// converted to JPEG. On conversion failure the caller keeps the original.
pub fn normalize<'a>(
    image: &'a SourceImage,
    converter: &dyn FormatConverter,
) -> Result<Cow<'a, SourceImage>, StageError> {
    if !image.is_heif() {
        debug!("No conversion needed for {}", image.media_type());
        return Ok(Cow::Borrowed(image));
    }

    let jpeg = converter.convert(image.data())?;
    let mut converted = SourceImage::new(jpeg, MediaFormat::Jpeg.media_type());
    if let Some(name) = image.filename() {
        converted = converted.with_filename(jpeg_filename(name));
    }
    Ok(Cow::Owned(converted))
}

fn jpeg_filename(name: &str) -> String {
    Path::new(name)
        .with_extension("jpg")
        .to_string_lossy()
        .into_owned()
}

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageResult};

/// Encode an image as baseline JPEG at the given quality (1-100)
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));

    // JPEG has no alpha channel
    match img {
        DynamicImage::ImageLuma8(gray) => encoder.encode_image(gray)?,
        DynamicImage::ImageRgb8(rgb) => encoder.encode_image(rgb)?,
        other => encoder.encode_image(&other.to_rgb8())?,
    }

    Ok(buffer)
}

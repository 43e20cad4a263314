//! Applies one [`PreprocessOption`] to a bitmap and re-encodes the result.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use log::trace;

use super::formats::{encode_jpeg, load_bitmap};
use super::variants::{CropMode, PreprocessOption, Rotation};
use crate::config::Config;
use crate::error::StageError;
use crate::types::SourceImage;

/// Bounds and encoding quality shared by every candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSettings {
    pub min_width: u32,
    pub max_width: u32,
    pub max_upscale: f32,
    pub quality: u8,
}

impl From<&Config> for TransformSettings {
    fn from(config: &Config) -> Self {
        Self {
            min_width: config.min_candidate_width,
            max_width: config.max_candidate_width,
            max_upscale: config.max_upscale,
            quality: config.candidate_quality,
        }
    }
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// A preprocessed, re-encoded image ready for the reader
#[derive(Debug, Clone)]
pub struct CandidateImage {
    option: PreprocessOption,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CandidateImage {
    pub fn option(&self) -> &PreprocessOption {
        &self.option
    }

    /// Raster width before encoding
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height before encoding
    pub fn height(&self) -> u32 {
        self.height
    }

    /// JPEG payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Decode `image` and apply `option` to it
pub fn transform(
    image: &SourceImage,
    option: &PreprocessOption,
    settings: &TransformSettings,
) -> Result<CandidateImage, StageError> {
    let bitmap = load_bitmap(image.data())?;
    transform_bitmap(&bitmap, option, settings)
}

/// Apply `option` to an already decoded bitmap
pub fn transform_bitmap(
    bitmap: &DynamicImage,
    option: &PreprocessOption,
    settings: &TransformSettings,
) -> Result<CandidateImage, StageError> {
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(StageError::Preprocess("Image has no pixels".to_string()));
    }

    let cropped = crop_center(bitmap, option.mode());
    let scaled = scale_to_bounds(cropped, settings);

    let mut gray = to_luma(&scaled);
    adjust_contrast(&mut gray, option.contrast());
    if let Some(threshold) = option.threshold() {
        binarize(&mut gray, threshold);
    }
    let rotated = rotate(&gray, option.rotation());

    let (width, height) = rotated.dimensions();
    let data = encode_jpeg(&DynamicImage::ImageLuma8(rotated), settings.quality)
        .map_err(|e| StageError::Preprocess(format!("Failed to encode candidate: {}", e)))?;

    trace!("Candidate [{}] {}x{} ({} bytes)", option, width, height, data.len());

    Ok(CandidateImage {
        option: *option,
        width,
        height,
        data,
    })
}

/// Crop a centered region sized by `mode`
pub fn crop_center(img: &DynamicImage, mode: CropMode) -> DynamicImage {
    if mode == CropMode::FullFrame {
        return img.clone();
    }

    let (width, height) = img.dimensions();
    let (fx, fy) = mode.fractions();
    let crop_w = ((width as f32 * fx).round() as u32).clamp(1, width);
    let crop_h = ((height as f32 * fy).round() as u32).clamp(1, height);
    let x = (width - crop_w) / 2;
    let y = (height - crop_h) / 2;

    img.crop_imm(x, y, crop_w, crop_h)
}

/// Factor that brings `width` into [min_width, max_width], capped at `max_upscale`
pub fn scale_factor(width: u32, settings: &TransformSettings) -> f32 {
    if width == 0 {
        return 1.0;
    }
    if width < settings.min_width {
        (settings.min_width as f32 / width as f32).min(settings.max_upscale)
    } else if width > settings.max_width {
        settings.max_width as f32 / width as f32
    } else {
        1.0
    }
}

fn scale_to_bounds(img: DynamicImage, settings: &TransformSettings) -> DynamicImage {
    let (width, height) = img.dimensions();
    let factor = scale_factor(width, settings);
    if factor == 1.0 {
        return img;
    }

    let new_w = ((width as f32 * factor).round() as u32).max(1);
    let new_h = ((height as f32 * factor).round() as u32).max(1);
    img.resize_exact(new_w, new_h, FilterType::Triangle)
}

/// Grayscale using 0.299R + 0.587G + 0.114B
pub fn to_luma(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    let mut gray = GrayImage::new(rgb.width(), rgb.height());
    for (src, dst) in rgb.pixels().zip(gray.pixels_mut()) {
        let value = 0.299 * src[0] as f32 + 0.587 * src[1] as f32 + 0.114 * src[2] as f32;
        *dst = Luma([value.round().clamp(0.0, 255.0) as u8]);
    }
    gray
}

/// Stretch values away from mid-gray by `factor`
pub fn adjust_contrast(gray: &mut GrayImage, factor: f32) {
    for pixel in gray.pixels_mut() {
        let value = (pixel[0] as f32 - 128.0) * factor + 128.0;
        pixel[0] = value.round().clamp(0.0, 255.0) as u8;
    }
}

/// Values at or above `threshold` become white, everything else black
pub fn binarize(gray: &mut GrayImage, threshold: u8) {
    for pixel in gray.pixels_mut() {
        pixel[0] = if pixel[0] >= threshold { 255 } else { 0 };
    }
}

pub fn rotate(gray: &GrayImage, rotation: Rotation) -> GrayImage {
    match rotation {
        Rotation::None => gray.clone(),
        Rotation::Cw90 => imageops::rotate90(gray),
        Rotation::Cw180 => imageops::rotate180(gray),
        Rotation::Cw270 => imageops::rotate270(gray),
    }
}

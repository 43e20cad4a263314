//! The fixed table of preprocessing options.
//!
//! Order matters: the attempt loop stops at the first success. Band crops
//! come before full frames, unrotated before rotated, and soft contrast
//! before hard binarization.

use serde::Serialize;
use std::fmt;

/// Centered crop applied before any pixel work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CropMode {
    /// 90% width x 35% height
    Band,
    /// 90% width x 50% height
    WideBand,
    /// No crop
    FullFrame,
}

impl CropMode {
    /// Fraction of (width, height) kept by this crop
    pub fn fractions(&self) -> (f32, f32) {
        match self {
            CropMode::Band => (0.9, 0.35),
            CropMode::WideBand => (0.9, 0.5),
            CropMode::FullFrame => (1.0, 1.0),
        }
    }
}

/// Quarter-turn rotations applied last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rotation {
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Rotation::Cw90 | Rotation::Cw270)
    }
}

/// One preprocessing configuration. Only constructed by [`generate_variants`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreprocessOption {
    mode: CropMode,
    contrast: f32,
    threshold: Option<u8>,
    rotation: Rotation,
}

impl PreprocessOption {
    const fn soft(mode: CropMode, contrast: f32, rotation: Rotation) -> Self {
        Self {
            mode,
            contrast,
            threshold: None,
            rotation,
        }
    }

    const fn binarized(mode: CropMode, contrast: f32, threshold: u8, rotation: Rotation) -> Self {
        Self {
            mode,
            contrast,
            threshold: Some(threshold),
            rotation,
        }
    }

    pub fn mode(&self) -> CropMode {
        self.mode
    }

    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    pub fn binarize(&self) -> bool {
        self.threshold.is_some()
    }

    /// Binarization threshold, present only when binarizing
    pub fn threshold(&self) -> Option<u8> {
        self.threshold
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }
}

impl fmt::Display for PreprocessOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} contrast={}", self.mode, self.contrast)?;
        if let Some(t) = self.threshold {
            write!(f, " threshold={}", t)?;
        }
        write!(f, " rotate={}", self.rotation.degrees())
    }
}

const VARIANTS: [PreprocessOption; 11] = [
    PreprocessOption::soft(CropMode::Band, 1.4, Rotation::None),
    PreprocessOption::binarized(CropMode::Band, 1.8, 140, Rotation::None),
    PreprocessOption::soft(CropMode::WideBand, 1.4, Rotation::None),
    PreprocessOption::binarized(CropMode::WideBand, 1.8, 128, Rotation::None),
    PreprocessOption::soft(CropMode::FullFrame, 1.6, Rotation::None),
    PreprocessOption::binarized(CropMode::FullFrame, 2.0, 128, Rotation::None),
    PreprocessOption::soft(CropMode::Band, 1.4, Rotation::Cw90),
    PreprocessOption::binarized(CropMode::Band, 1.8, 140, Rotation::Cw90),
    PreprocessOption::soft(CropMode::WideBand, 1.6, Rotation::Cw90),
    PreprocessOption::soft(CropMode::FullFrame, 1.6, Rotation::Cw90),
    PreprocessOption::binarized(CropMode::FullFrame, 2.0, 128, Rotation::Cw90),
];

/// Number of entries produced by [`generate_variants`]
pub const VARIANT_COUNT: usize = VARIANTS.len();

/// The ordered, finite list of preprocessing options to try
pub fn generate_variants() -> impl Iterator<Item = PreprocessOption> + Clone {
    VARIANTS.iter().copied()
}

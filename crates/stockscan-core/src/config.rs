use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Symbology;

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Configuration for the barcode decoding pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Symbologies the reader is restricted to
    pub symbologies: Vec<Symbology>,

    /// Whether to try the fast-path detector before preprocessing
    pub fast_path: bool,

    /// JPEG quality used when converting HEIC/HEIF uploads (1-100)
    pub conversion_quality: u8,

    /// JPEG quality used when re-encoding preprocessed candidates (1-100)
    pub candidate_quality: u8,

    /// Candidates narrower than this are scaled up (subject to `max_upscale`)
    pub min_candidate_width: u32,

    /// Candidates wider than this are scaled down
    pub max_candidate_width: u32,

    /// Largest magnification applied when scaling up
    pub max_upscale: f32,

    /// Ask the reader to spend more effort per image
    pub try_harder: bool,

    /// Maximum directory depth when collecting photos
    pub max_depth: Option<usize>,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbologies: vec![
                Symbology::Code128,
                Symbology::Code39,
                Symbology::Ean13,
                Symbology::Ean8,
                Symbology::UpcA,
            ],
            fast_path: true,
            conversion_quality: 90,
            candidate_quality: 92,
            min_candidate_width: 1000,
            max_candidate_width: 2200,
            max_upscale: 2.0,
            try_harder: true,
            max_depth: None,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.symbologies.is_empty() {
            return Err(Error::Configuration(
                "At least one symbology must be enabled".to_string(),
            ));
        }

        for (name, quality) in [
            ("conversion_quality", self.conversion_quality),
            ("candidate_quality", self.candidate_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(Error::Configuration(format!(
                    "{} must be between 1 and 100",
                    name
                )));
            }
        }

        if self.min_candidate_width == 0 || self.min_candidate_width > self.max_candidate_width {
            return Err(Error::Configuration(
                "Candidate width bounds must satisfy 0 < min <= max".to_string(),
            ));
        }

        if self.max_upscale.is_nan() || self.max_upscale < 1.0 {
            return Err(Error::Configuration(
                "max_upscale must be at least 1.0".to_string(),
            ));
        }

        Ok(())
    }
}

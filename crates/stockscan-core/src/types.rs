use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Still-image encodings the pipeline distinguishes between
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Heic,
    Other(String),
}

/// HEIF brands found in the `ftyp` box of camera uploads
const HEIF_BRANDS: [&[u8; 4]; 8] = [
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];

impl MediaFormat {
    /// Determine format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "gif" => Self::Gif,
            "webp" => Self::Webp,
            "heic" | "heif" => Self::Heic,
            other => Self::Other(other.to_string()),
        }
    }

    /// Determine format from a declared media type such as `image/heic`
    pub fn from_media_type(media_type: &str) -> Self {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Self::Jpeg,
            "image/png" => Self::Png,
            "image/gif" => Self::Gif,
            "image/webp" => Self::Webp,
            "image/heic" | "image/heif" | "image/heic-sequence" | "image/heif-sequence" => {
                Self::Heic
            }
            other => Self::Other(other.to_string()),
        }
    }

    /// Recognize a HEIF container from its leading bytes
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.len() >= 12 && &data[4..8] == b"ftyp" {
            let brand = &data[8..12];
            if HEIF_BRANDS.iter().any(|b| &b[..] == brand) {
                return Some(Self::Heic);
            }
        }
        None
    }

    /// Whether the raster layer can decode this format without conversion
    pub fn is_natively_decodable(&self) -> bool {
        match self {
            Self::Jpeg | Self::Png | Self::Gif | Self::Webp => true,
            Self::Heic | Self::Other(_) => false,
        }
    }

    /// Canonical media type string
    pub fn media_type(&self) -> &str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Heic => "image/heic",
            Self::Other(_) => "application/octet-stream",
        }
    }
}

/// Linear barcode symbologies the reader may be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbology {
    Code128,
    Code39,
    Code93,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Itf,
    Codabar,
}

impl Symbology {
    pub const ALL: [Symbology; 9] = [
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Code93,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Itf,
        Symbology::Codabar,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Symbology::Code128 => "code128",
            Symbology::Code39 => "code39",
            Symbology::Code93 => "code93",
            Symbology::Ean13 => "ean13",
            Symbology::Ean8 => "ean8",
            Symbology::UpcA => "upca",
            Symbology::UpcE => "upce",
            Symbology::Itf => "itf",
            Symbology::Codabar => "codabar",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Symbology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        Symbology::ALL
            .iter()
            .copied()
            .find(|sym| sym.name() == key)
            .ok_or_else(|| Error::Configuration(format!("Unknown symbology: {}", s)))
    }
}

/// An image payload as received from the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    data: Vec<u8>,
    media_type: String,
    filename: Option<String>,
}

impl SourceImage {
    pub fn new(data: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            data,
            media_type: media_type.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Read a photo from disk, declaring its media type from the extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let data = std::fs::read(path)?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(MediaFormat::from_extension)
            .unwrap_or_else(|| MediaFormat::Other(String::new()));
        let mut image = Self::new(data, format.media_type());
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            image = image.with_filename(name);
        }
        Ok(image)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Format declared by the media type, falling back to the filename extension
    pub fn declared_format(&self) -> MediaFormat {
        let from_type = MediaFormat::from_media_type(&self.media_type);
        if !matches!(from_type, MediaFormat::Other(_)) {
            return from_type;
        }
        self.filename
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|e| e.to_str())
            .map(MediaFormat::from_extension)
            .unwrap_or(from_type)
    }

    /// True when the media type, extension or container bytes say HEIC/HEIF
    pub fn is_heif(&self) -> bool {
        if MediaFormat::from_media_type(&self.media_type) == MediaFormat::Heic {
            return true;
        }
        let by_extension = self
            .filename
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|e| e.to_str())
            .map(|e| MediaFormat::from_extension(e) == MediaFormat::Heic)
            .unwrap_or(false);
        by_extension || MediaFormat::sniff(&self.data) == Some(MediaFormat::Heic)
    }
}

/// A successfully read barcode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedBarcode {
    text: String,
    symbology: Option<Symbology>,
}

impl DecodedBarcode {
    /// Returns `None` for empty or whitespace-only text
    pub fn new(text: impl Into<String>, symbology: Option<Symbology>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self { text, symbology })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn symbology(&self) -> Option<Symbology> {
        self.symbology
    }
}

/// Terminal result of one pipeline invocation
#[derive(Debug)]
pub enum DecodeOutcome {
    Success(DecodedBarcode),
    Failure(Error),
}

impl DecodeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DecodeOutcome::Success(_))
    }

    pub fn barcode(&self) -> Option<&DecodedBarcode> {
        match self {
            DecodeOutcome::Success(barcode) => Some(barcode),
            DecodeOutcome::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<DecodedBarcode> {
        match self {
            DecodeOutcome::Success(barcode) => Ok(barcode),
            DecodeOutcome::Failure(e) => Err(e),
        }
    }
}

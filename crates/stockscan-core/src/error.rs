use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Caller-facing error types for the stockscan library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// File not found error
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid or missing configuration; retrying cannot help
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Every decode attempt failed
    #[error("No barcode found after {attempts} attempts")]
    Exhausted {
        attempts: usize,
        #[source]
        last_error: Option<StageError>,
    },
}

impl Error {
    /// Message safe to show to warehouse staff. Internal detail stays in the log.
    pub fn user_message(&self) -> String {
        match self {
            Error::Configuration(msg) => format!("Barcode scanning is not configured: {}", msg),
            Error::Exhausted { .. } => "Could not read a barcode from this photo".to_string(),
            Error::FileNotFound(path) => format!("Photo not found: {}", path.display()),
            Error::Io(_) | Error::Image(_) => "Could not open this photo".to_string(),
        }
    }
}

/// A single stage of the pipeline failed. These are always caught by the
/// attempt loop and turned into "try the next option".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// Format conversion failed; the original payload is used instead
    #[error("Format normalization failed: {0}")]
    Normalize(String),

    /// Rendering or pixel access failed for one preprocessing option
    #[error("Preprocessing failed: {0}")]
    Preprocess(String),

    /// The reader ran but found nothing
    #[error("No barcode found")]
    NotFound,

    /// The reader itself failed
    #[error("Decode failed: {0}")]
    Decode(String),

    /// The reader returned only whitespace
    #[error("Decoder returned an empty result")]
    EmptyResult,
}

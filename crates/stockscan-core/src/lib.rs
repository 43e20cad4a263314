//! Core functionality for reading linear barcodes from product label photos.
//!
//! This library prepares phone photos for a barcode reader:
//! - Format normalization (HEIC/HEIF to JPEG)
//! - An optional fast-path detector on the unprocessed image
//! - A fixed sequence of crop / contrast / binarization / rotation variants
//! - Raw fallbacks on the normalized and original payloads
//!
//! Every call ends in exactly one [`DecodeOutcome`] after a bounded number
//! of attempts.

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result, StageError};
pub use pipeline::{Attempt, AttemptLog, AttemptResult, AttemptStage, Pipeline, MAX_ATTEMPTS};
pub use scanner::BarcodeScanner;
pub use types::*;

// -- Public Modules --
pub mod config;
pub mod decoding;
pub mod discovery;
pub mod logging;
pub mod pipeline;
pub mod processing;
pub mod scanner;
pub mod types;

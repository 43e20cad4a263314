use std::path::Path;

use log::warn;
use once_cell::unsync::OnceCell;

use crate::config::Config;
use crate::decoding::{BarcodeReader, FastDetector, RxingDetector, RxingReader};
use crate::error::Error;
use crate::logging::log_decode_failure;
use crate::pipeline::{AttemptLog, Pipeline};
use crate::processing::{FormatConverter, HeifConverter, TransformSettings};
use crate::types::{DecodeOutcome, SourceImage};

/// Composition root for the decode pipeline.
///
/// Owns the reader handle, which is built on first use and reused for every
/// later call. Calls are expected to run one at a time.
pub struct BarcodeScanner {
    config: Config,
    reader: OnceCell<Box<dyn BarcodeReader>>,
    detector: OnceCell<Option<Box<dyn FastDetector>>>,
    converter: Box<dyn FormatConverter>,
}

impl BarcodeScanner {
    /// Create a scanner backed by rxing and libheif
    pub fn new(config: Config) -> Self {
        let converter = HeifConverter::new(config.conversion_quality);
        Self {
            config,
            reader: OnceCell::new(),
            detector: OnceCell::new(),
            converter: Box::new(converter),
        }
    }

    /// Use a specific reader instead of the rxing default
    pub fn with_reader(self, reader: impl BarcodeReader + 'static) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(Box::new(reader) as Box<dyn BarcodeReader>);
        Self {
            reader: cell,
            ..self
        }
    }

    /// Use a specific fast-path detector, or `None` to skip the fast path
    pub fn with_detector(self, detector: Option<Box<dyn FastDetector>>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(detector);
        Self {
            detector: cell,
            ..self
        }
    }

    pub fn with_converter(self, converter: impl FormatConverter + 'static) -> Self {
        Self {
            converter: Box::new(converter),
            ..self
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn reader(&self) -> crate::Result<&dyn BarcodeReader> {
        let reader = self.reader.get_or_try_init(|| {
            RxingReader::new(&self.config.symbologies, self.config.try_harder)
                .map(|r| Box::new(r) as Box<dyn BarcodeReader>)
        })?;
        Ok(&**reader)
    }

    fn detector(&self) -> Option<&dyn FastDetector> {
        self.detector
            .get_or_init(|| {
                if !self.config.fast_path {
                    return None;
                }
                match RxingDetector::new(&self.config.symbologies) {
                    Ok(d) => Some(Box::new(d) as Box<dyn FastDetector>),
                    Err(e) => {
                        warn!("Fast-path detector unavailable: {}", e);
                        None
                    }
                }
            })
            .as_deref()
    }

    pub fn decode(&self, image: SourceImage) -> DecodeOutcome {
        self.decode_traced(image).0
    }

    /// Decode and return the attempt log alongside the outcome
    pub fn decode_traced(&self, image: SourceImage) -> (DecodeOutcome, AttemptLog) {
        let name = image.filename().map(str::to_owned);

        let (outcome, log) = match self.pipeline() {
            Ok(pipeline) => pipeline.decode_traced(image),
            Err(e) => (DecodeOutcome::Failure(e), AttemptLog::default()),
        };

        if let DecodeOutcome::Failure(e) = &outcome {
            log_decode_failure(name.as_deref(), e);
        }
        (outcome, log)
    }

    /// Read a photo from disk and decode it
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> DecodeOutcome {
        match SourceImage::from_path(path) {
            Ok(image) => self.decode(image),
            Err(e) => DecodeOutcome::Failure(e),
        }
    }

    fn pipeline(&self) -> crate::Result<Pipeline<'_>> {
        self.config.validate()?;
        let reader = self.reader().map_err(|e| match e {
            Error::Configuration(_) => e,
            other => Error::Configuration(other.to_string()),
        })?;

        Ok(
            Pipeline::new(reader, self.converter.as_ref(), TransformSettings::from(&self.config))
                .with_detector(self.detector()),
        )
    }
}

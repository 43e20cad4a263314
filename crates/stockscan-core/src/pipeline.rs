//! # Decode Pipeline
//!
//! Turns one photo into one [`DecodeOutcome`] through a fixed, bounded
//! sequence of attempts:
//!
//! 1. Normalize the format (HEIC/HEIF becomes JPEG). A failed conversion
//!    is recorded and the original payload is used instead.
//! 2. Fast-path detection on the normalized bitmap, if a detector is present.
//! 3. Every preprocessing option from [`generate_variants`], in order.
//! 4. A raw scan of the normalized payload.
//! 5. A raw scan of the original payload, only if conversion produced a new one.
//!
//! The first success ends the sequence. Stage errors never escape; the most
//! recent one is carried by the final [`Error::Exhausted`].
//!
//! At most `1 + VARIANT_COUNT + 2` attempts are made per call.

use std::borrow::Cow;

use image::DynamicImage;
use log::{debug, info};

use crate::decoding::{try_fast_detect, BarcodeReader, FastDetector};
use crate::error::{Error, StageError};
use crate::logging::log_stage_error;
use crate::processing::{
    generate_variants, load_bitmap, normalize, transform_bitmap, FormatConverter,
    PreprocessOption, TransformSettings, VARIANT_COUNT,
};
use crate::types::{DecodeOutcome, DecodedBarcode, SourceImage};

/// Upper bound on attempts for a single call
pub const MAX_ATTEMPTS: usize = 1 + VARIANT_COUNT + 2;

/// Which step of the sequence an attempt belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptStage {
    FastPath,
    Variant {
        index: usize,
        option: PreprocessOption,
    },
    RawNormalized,
    RawOriginal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptResult {
    Success(DecodedBarcode),
    /// The fast path ran and found nothing
    Empty,
    Failed(StageError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub stage: AttemptStage,
    pub result: AttemptResult,
}

/// Per-call record of every attempt and the latest stage error
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttemptLog {
    attempts: Vec<Attempt>,
    normalize_error: Option<StageError>,
    last_error: Option<StageError>,
}

impl AttemptLog {
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Set when format conversion failed and the original was used
    pub fn normalize_error(&self) -> Option<&StageError> {
        self.normalize_error.as_ref()
    }

    pub fn last_error(&self) -> Option<&StageError> {
        self.last_error.as_ref()
    }

    fn record_normalize_failure(&mut self, error: StageError) {
        log_stage_error("normalize", &error);
        self.normalize_error = Some(error.clone());
        self.last_error = Some(error);
    }

    /// Record an attempt, returning the barcode if it succeeded
    fn record(
        &mut self,
        stage: AttemptStage,
        result: Result<Option<DecodedBarcode>, StageError>,
    ) -> Option<DecodedBarcode> {
        let (result, found) = match result {
            Ok(Some(barcode)) => (AttemptResult::Success(barcode.clone()), Some(barcode)),
            Ok(None) => (AttemptResult::Empty, None),
            Err(error) => {
                log_stage_error(stage.label(), &error);
                self.last_error = Some(error.clone());
                (AttemptResult::Failed(error), None)
            }
        };
        debug!("Attempt {} [{}]: {:?}", self.attempts.len() + 1, stage.label(), result);
        self.attempts.push(Attempt { stage, result });
        found
    }
}

impl AttemptStage {
    fn label(&self) -> &'static str {
        match self {
            AttemptStage::FastPath => "fast-path",
            AttemptStage::Variant { .. } => "variant",
            AttemptStage::RawNormalized => "raw-normalized",
            AttemptStage::RawOriginal => "raw-original",
        }
    }
}

/// One configured decode sequence. Holds only borrowed collaborators, so it
/// is cheap to build per call.
pub struct Pipeline<'a> {
    reader: &'a dyn BarcodeReader,
    detector: Option<&'a dyn FastDetector>,
    converter: &'a dyn FormatConverter,
    settings: TransformSettings,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        reader: &'a dyn BarcodeReader,
        converter: &'a dyn FormatConverter,
        settings: TransformSettings,
    ) -> Self {
        Self {
            reader,
            detector: None,
            converter,
            settings,
        }
    }

    pub fn with_detector(mut self, detector: Option<&'a dyn FastDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn decode(&self, image: SourceImage) -> DecodeOutcome {
        self.decode_traced(image).0
    }

    /// Decode and also return the full attempt log
    pub fn decode_traced(&self, image: SourceImage) -> (DecodeOutcome, AttemptLog) {
        let mut log = AttemptLog::default();
        let outcome = match self.run(&image, &mut log) {
            Some(barcode) => {
                info!(
                    "Decoded '{}' ({:?}) after {} attempts",
                    barcode.text(),
                    barcode.symbology(),
                    log.len()
                );
                DecodeOutcome::Success(barcode)
            }
            None => DecodeOutcome::Failure(Error::Exhausted {
                attempts: log.len(),
                last_error: log.last_error.clone(),
            }),
        };
        (outcome, log)
    }

    fn run(&self, original: &SourceImage, log: &mut AttemptLog) -> Option<DecodedBarcode> {
        let normalized = match normalize(original, self.converter) {
            Ok(normalized) => normalized,
            Err(e) => {
                log.record_normalize_failure(e);
                Cow::Borrowed(original)
            }
        };

        // Rendered once, shared by the fast path and every variant
        let bitmap = load_bitmap(normalized.data());

        if let Some(detector) = self.detector {
            let result = with_bitmap(&bitmap, |b| try_fast_detect(detector, b));
            if let Some(found) = log.record(AttemptStage::FastPath, result) {
                return Some(found);
            }
        }

        for (index, option) in generate_variants().enumerate() {
            let result = with_bitmap(&bitmap, |b| transform_bitmap(b, &option, &self.settings))
                .and_then(|candidate| self.reader.scan(candidate.data()))
                .map(Some);
            if let Some(found) = log.record(AttemptStage::Variant { index, option }, result) {
                return Some(found);
            }
        }

        let result = self.reader.scan(normalized.data()).map(Some);
        if let Some(found) = log.record(AttemptStage::RawNormalized, result) {
            return Some(found);
        }

        if let Cow::Owned(_) = normalized {
            let result = self.reader.scan(original.data()).map(Some);
            if let Some(found) = log.record(AttemptStage::RawOriginal, result) {
                return Some(found);
            }
        }

        None
    }
}

fn with_bitmap<T>(
    bitmap: &Result<DynamicImage, StageError>,
    f: impl FnOnce(&DynamicImage) -> Result<T, StageError>,
) -> Result<T, StageError> {
    match bitmap {
        Ok(b) => f(b),
        Err(e) => Err(e.clone()),
    }
}

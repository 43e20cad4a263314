use std::collections::HashSet;

use image::DynamicImage;
use log::{debug, trace};
use rxing::common::HybridBinarizer;
use rxing::multi::{GenericMultipleBarcodeReader, MultipleBarcodeReader};
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintType, DecodeHintValue, DecodingHintDictionary,
    Exceptions, Luma8LuminanceSource, MultiFormatReader, RXingResult, Reader,
};

use super::{BarcodeReader, Detection, FastDetector};
use crate::error::{Error, Result, StageError};
use crate::processing::load_bitmap;
use crate::types::{DecodedBarcode, Symbology};

fn to_rxing_format(symbology: Symbology) -> BarcodeFormat {
    match symbology {
        Symbology::Code128 => BarcodeFormat::CODE_128,
        Symbology::Code39 => BarcodeFormat::CODE_39,
        Symbology::Code93 => BarcodeFormat::CODE_93,
        Symbology::Ean13 => BarcodeFormat::EAN_13,
        Symbology::Ean8 => BarcodeFormat::EAN_8,
        Symbology::UpcA => BarcodeFormat::UPC_A,
        Symbology::UpcE => BarcodeFormat::UPC_E,
        Symbology::Itf => BarcodeFormat::ITF,
        Symbology::Codabar => BarcodeFormat::CODABAR,
    }
}

fn from_rxing_format(format: &BarcodeFormat) -> Option<Symbology> {
    Symbology::ALL
        .iter()
        .copied()
        .find(|s| to_rxing_format(*s) == *format)
}

fn build_hints(symbologies: &[Symbology], try_harder: bool) -> Result<DecodingHintDictionary> {
    let formats: HashSet<BarcodeFormat> =
        symbologies.iter().copied().map(to_rxing_format).collect();
    if formats.is_empty() {
        return Err(Error::Configuration(
            "No symbologies enabled for the reader".to_string(),
        ));
    }

    let mut hints = DecodingHintDictionary::new();
    hints.insert(
        DecodeHintType::POSSIBLE_FORMATS,
        DecodeHintValue::PossibleFormats(formats),
    );
    if try_harder {
        hints.insert(DecodeHintType::TRY_HARDER, DecodeHintValue::TryHarder(true));
    }
    Ok(hints)
}

fn luma_bitmap(img: &DynamicImage) -> BinaryBitmap<HybridBinarizer<Luma8LuminanceSource>> {
    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();
    let source = Luma8LuminanceSource::new(gray.into_raw(), width, height);
    BinaryBitmap::new(HybridBinarizer::new(source))
}

fn map_exception(e: Exceptions) -> StageError {
    match e {
        Exceptions::NotFoundException(_) => StageError::NotFound,
        other => StageError::Decode(other.to_string()),
    }
}

fn to_decoded(result: &RXingResult) -> Option<DecodedBarcode> {
    DecodedBarcode::new(
        result.getText(),
        from_rxing_format(result.getBarcodeFormat()),
    )
}

/// Reader restricted to a symbology allow-list, backed by rxing
pub struct RxingReader {
    hints: DecodingHintDictionary,
}

impl RxingReader {
    pub fn new(symbologies: &[Symbology], try_harder: bool) -> Result<Self> {
        let hints = build_hints(symbologies, try_harder)?;
        debug!(
            "Initialized rxing reader for {:?} (try_harder={})",
            symbologies, try_harder
        );
        Ok(Self { hints })
    }
}

impl BarcodeReader for RxingReader {
    fn scan(&self, payload: &[u8]) -> std::result::Result<DecodedBarcode, StageError> {
        let img = load_bitmap(payload)?;
        let mut bitmap = luma_bitmap(&img);
        let mut reader = MultiFormatReader::default();

        let result = reader
            .decode_with_hints(&mut bitmap, &self.hints)
            .map_err(map_exception)?;
        trace!("rxing read {:?}: {}", result.getBarcodeFormat(), result.getText());

        to_decoded(&result).ok_or(StageError::EmptyResult)
    }
}

/// Multi-barcode detector used for the fast path. No try-harder, no preprocessing.
pub struct RxingDetector {
    hints: DecodingHintDictionary,
}

impl RxingDetector {
    pub fn new(symbologies: &[Symbology]) -> Result<Self> {
        Ok(Self {
            hints: build_hints(symbologies, false)?,
        })
    }
}

impl FastDetector for RxingDetector {
    fn detect(&self, bitmap: &DynamicImage) -> std::result::Result<Vec<Detection>, StageError> {
        let mut binary = luma_bitmap(bitmap);
        let mut reader = GenericMultipleBarcodeReader::new(MultiFormatReader::default());

        let results = match reader.decode_multiple_with_hints(&mut binary, &self.hints) {
            Ok(results) => results,
            Err(Exceptions::NotFoundException(_)) => Vec::new(),
            Err(e) => return Err(StageError::Decode(e.to_string())),
        };

        Ok(results
            .iter()
            .map(|r| Detection {
                raw_value: r.getText().to_string(),
                symbology: from_rxing_format(r.getBarcodeFormat()),
            })
            .collect())
    }
}

//! Test doubles and synthetic images shared by the integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};

use stockscan_core::decoding::{BarcodeReader, Detection, FastDetector};
use stockscan_core::processing::{encode_jpeg, FormatConverter};
use stockscan_core::{DecodedBarcode, StageError, Symbology};

/// Reader whose answer is scripted per call. `respond` gets the 1-based call
/// number and the payload; `None` means "not found".
pub struct ScriptedReader<F> {
    respond: F,
    calls: Cell<usize>,
    payloads: RefCell<Vec<Vec<u8>>>,
}

impl<F> ScriptedReader<F>
where
    F: Fn(usize, &[u8]) -> Option<String>,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: Cell::new(0),
            payloads: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.borrow().clone()
    }
}

impl<F> BarcodeReader for ScriptedReader<F>
where
    F: Fn(usize, &[u8]) -> Option<String>,
{
    fn scan(&self, payload: &[u8]) -> Result<DecodedBarcode, StageError> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        self.payloads.borrow_mut().push(payload.to_vec());

        match (self.respond)(call, payload) {
            Some(text) => {
                DecodedBarcode::new(text, Some(Symbology::Code128)).ok_or(StageError::EmptyResult)
            }
            None => Err(StageError::NotFound),
        }
    }
}

pub fn failing_reader() -> ScriptedReader<impl Fn(usize, &[u8]) -> Option<String>> {
    ScriptedReader::new(|_: usize, _: &[u8]| None)
}

/// Detector returning a fixed list of raw values
pub struct FixedDetector {
    values: Vec<String>,
    calls: Cell<usize>,
}

impl FixedDetector {
    pub fn new(values: &[&str]) -> Self {
        Self {
            values: values.iter().map(|v| v.to_string()).collect(),
            calls: Cell::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl FastDetector for FixedDetector {
    fn detect(&self, _bitmap: &DynamicImage) -> Result<Vec<Detection>, StageError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self
            .values
            .iter()
            .map(|v| Detection {
                raw_value: v.clone(),
                symbology: Some(Symbology::Ean13),
            })
            .collect())
    }
}

/// Converter with a fixed result
pub struct StubConverter {
    result: Result<Vec<u8>, StageError>,
    calls: Cell<usize>,
}

impl StubConverter {
    pub fn converting_to(data: Vec<u8>) -> Self {
        Self {
            result: Ok(data),
            calls: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(StageError::Normalize("libheif: unsupported codec".to_string())),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl FormatConverter for StubConverter {
    fn convert(&self, _data: &[u8]) -> Result<Vec<u8>, StageError> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone()
    }
}

/// A colorful gradient photo encoded as JPEG
pub fn label_photo(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * 3 + y) % 256) as u8])
    });
    encode_jpeg(&DynamicImage::ImageRgb8(img), 90).unwrap()
}

/// Dimensions of an encoded payload, if it renders
pub fn dimensions(payload: &[u8]) -> Option<(u32, u32)> {
    image::load_from_memory(payload)
        .ok()
        .map(|img| (img.width(), img.height()))
}

/// Whether a payload still has gray levels, i.e. was not binarized
pub fn has_mid_tones(payload: &[u8]) -> bool {
    match image::load_from_memory(payload) {
        Ok(img) => {
            let gray = img.to_luma8();
            let mid = gray.pixels().filter(|p| p[0] > 64 && p[0] < 192).count();
            mid * 10 > gray.pixels().count()
        }
        Err(_) => false,
    }
}

/// A Code 128 symbol printed on a white label, centered in a gray photo
pub fn code128_photo(text: &str) -> Vec<u8> {
    let matrix = MultiFormatWriter::default()
        .encode(text, &BarcodeFormat::CODE_128, 600, 160)
        .unwrap();

    let (width, height) = (1200u32, 800u32);
    let mut canvas = GrayImage::from_pixel(width, height, Luma([150]));
    let (label_w, label_h) = (matrix.getWidth() + 80, matrix.getHeight() + 80);
    let (label_x, label_y) = ((width - label_w) / 2, (height - label_h) / 2);

    for y in 0..label_h {
        for x in 0..label_w {
            canvas.put_pixel(label_x + x, label_y + y, Luma([250]));
        }
    }
    for y in 0..matrix.getHeight() {
        for x in 0..matrix.getWidth() {
            if matrix.get(x, y) {
                canvas.put_pixel(label_x + 40 + x, label_y + 40 + y, Luma([15]));
            }
        }
    }

    encode_jpeg(&DynamicImage::ImageLuma8(canvas), 95).unwrap()
}

/// A smooth, barcode-free photo: a soft horizontal light falloff
pub fn plain_photo(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, _| {
        Luma([(90 + (x * 80 / width.max(1))) as u8])
    });
    encode_jpeg(&DynamicImage::ImageLuma8(img), 90).unwrap()
}

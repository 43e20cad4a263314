mod common;

use common::{
    dimensions, failing_reader, has_mid_tones, label_photo, FixedDetector, ScriptedReader,
    StubConverter,
};
use stockscan_core::processing::{CropMode, Rotation, TransformSettings, VARIANT_COUNT};
use stockscan_core::{
    AttemptResult, AttemptStage, DecodeOutcome, Error, Pipeline, SourceImage, StageError,
    MAX_ATTEMPTS,
};

fn jpeg_source() -> SourceImage {
    SourceImage::new(label_photo(1200, 800), "image/jpeg").with_filename("shelf.jpg")
}

fn heic_source() -> SourceImage {
    SourceImage::new(b"\0\0\0\x18ftypheic-pretend-hevc".to_vec(), "image/heic")
        .with_filename("IMG_0001.HEIC")
}

#[test]
fn test_always_failing_reader_makes_fourteen_attempts() {
    let reader = failing_reader();
    let detector = FixedDetector::empty();
    let converter = StubConverter::converting_to(label_photo(1200, 800));

    let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default())
        .with_detector(Some(&detector));
    let (outcome, log) = pipeline.decode_traced(heic_source());

    assert_eq!(log.len(), 14);
    assert_eq!(MAX_ATTEMPTS, 14);
    assert_eq!(detector.calls(), 1);
    assert_eq!(reader.calls(), VARIANT_COUNT + 2);
    assert_eq!(log.attempts()[0].result, AttemptResult::Empty);
    assert_eq!(log.attempts()[12].stage, AttemptStage::RawNormalized);
    assert_eq!(log.attempts()[13].stage, AttemptStage::RawOriginal);

    match outcome {
        DecodeOutcome::Failure(Error::Exhausted {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 14);
            assert_eq!(last_error, Some(StageError::NotFound));
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[test]
fn test_unconverted_input_skips_original_fallback() {
    let reader = failing_reader();
    let detector = FixedDetector::empty();
    let converter = StubConverter::failing();

    let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default())
        .with_detector(Some(&detector));
    let (outcome, log) = pipeline.decode_traced(jpeg_source());

    assert!(!outcome.is_success());
    assert_eq!(log.len(), 13);
    assert_eq!(converter.calls(), 0);
    assert!(log
        .attempts()
        .iter()
        .all(|a| a.stage != AttemptStage::RawOriginal));
}

#[test]
fn test_first_success_wins() {
    for k in 1..=VARIANT_COUNT {
        let reader = ScriptedReader::new(|call: usize, _: &[u8]| {
            (call == k).then(|| "8801234567893".to_string())
        });
        let detector = FixedDetector::empty();
        let converter = StubConverter::failing();

        let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default())
            .with_detector(Some(&detector));
        let (outcome, log) = pipeline.decode_traced(jpeg_source());

        assert_eq!(outcome.barcode().unwrap().text(), "8801234567893");
        assert_eq!(reader.calls(), k, "variant {} should be the last one tried", k);
        assert_eq!(log.len(), 1 + k);
        match &log.attempts()[k].stage {
            AttemptStage::Variant { index, .. } => assert_eq!(*index, k - 1),
            other => panic!("unexpected stage {:?}", other),
        }
    }
}

#[test]
fn test_full_frame_soft_variant_scenario() {
    // Only an uncropped, unrotated, non-binarized candidate decodes
    let reader = ScriptedReader::new(|_: usize, payload: &[u8]| {
        (dimensions(payload) == Some((1200, 800)) && has_mid_tones(payload))
            .then(|| "STOCK-0042".to_string())
    });
    let detector = FixedDetector::empty();
    let converter = StubConverter::failing();

    let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default())
        .with_detector(Some(&detector));
    let (outcome, log) = pipeline.decode_traced(jpeg_source());

    assert_eq!(outcome.barcode().unwrap().text(), "STOCK-0042");
    // Fast path plus four band variants come first
    assert_eq!(log.len(), 6);
    assert_eq!(reader.calls(), 5);

    match &log.attempts()[5].stage {
        AttemptStage::Variant { index, option } => {
            assert_eq!(*index, 4);
            assert_eq!(option.mode(), CropMode::FullFrame);
            assert_eq!(option.contrast(), 1.6);
            assert!(!option.binarize());
            assert_eq!(option.rotation(), Rotation::None);
        }
        other => panic!("unexpected stage {:?}", other),
    }
}

#[test]
fn test_band_candidates_reach_reader_cropped() {
    let reader = failing_reader();
    let converter = StubConverter::failing();

    let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default());
    pipeline.decode(jpeg_source());

    let dims: Vec<_> = reader.payloads().iter().map(|p| dimensions(p)).collect();
    assert_eq!(dims[0], Some((1080, 280)));
    assert_eq!(dims[2], Some((1080, 400)));
    assert_eq!(dims[4], Some((1200, 800)));
    // Rotated band
    assert_eq!(dims[6], Some((280, 1080)));
}

#[test]
fn test_blank_results_are_not_success() {
    let reader = ScriptedReader::new(|call: usize, _: &[u8]| {
        Some(if call < 3 { "  \t ".to_string() } else { "ABC-123".to_string() })
    });
    let detector = FixedDetector::new(&["", "   "]);
    let converter = StubConverter::failing();

    let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default())
        .with_detector(Some(&detector));
    let (outcome, log) = pipeline.decode_traced(jpeg_source());

    assert_eq!(outcome.barcode().unwrap().text(), "ABC-123");
    assert_eq!(log.attempts()[0].result, AttemptResult::Empty);
    assert_eq!(
        log.attempts()[1].result,
        AttemptResult::Failed(StageError::EmptyResult)
    );
    assert_eq!(
        log.attempts()[2].result,
        AttemptResult::Failed(StageError::EmptyResult)
    );
    assert_eq!(log.len(), 4);
}

#[test]
fn test_fast_path_success_short_circuits() {
    let reader = failing_reader();
    let detector = FixedDetector::new(&["", "4710088412345"]);
    let converter = StubConverter::failing();

    let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default())
        .with_detector(Some(&detector));
    let (outcome, log) = pipeline.decode_traced(jpeg_source());

    let barcode = outcome.barcode().unwrap();
    assert_eq!(barcode.text(), "4710088412345");
    assert_eq!(log.len(), 1);
    assert_eq!(log.attempts()[0].stage, AttemptStage::FastPath);
    assert_eq!(reader.calls(), 0);
}

#[test]
fn test_without_detector_fast_path_is_skipped() {
    let reader = failing_reader();
    let converter = StubConverter::failing();

    let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default());
    let (_, log) = pipeline.decode_traced(jpeg_source());

    assert_eq!(log.len(), VARIANT_COUNT + 1);
    assert!(log
        .attempts()
        .iter()
        .all(|a| a.stage != AttemptStage::FastPath));
}

#[test]
fn test_conversion_failure_still_tries_original() {
    let reader = failing_reader();
    let detector = FixedDetector::empty();
    let converter = StubConverter::failing();
    let source = heic_source();
    let original = source.data().to_vec();

    let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default())
        .with_detector(Some(&detector));
    let (outcome, log) = pipeline.decode_traced(source);

    assert_eq!(converter.calls(), 1);
    assert!(matches!(log.normalize_error(), Some(StageError::Normalize(_))));

    // Fast path + 11 variants + one raw attempt on the untouched original
    assert_eq!(log.len(), 13);
    assert_eq!(log.attempts()[12].stage, AttemptStage::RawNormalized);
    assert_eq!(reader.payloads(), vec![original]);

    // The original does not render, so every variant fails in preprocessing
    assert!(log.attempts()[1..12]
        .iter()
        .all(|a| matches!(a.result, AttemptResult::Failed(StageError::Preprocess(_)))));
    assert!(matches!(
        outcome,
        DecodeOutcome::Failure(Error::Exhausted {
            attempts: 13,
            last_error: Some(StageError::NotFound)
        })
    ));
}

#[test]
fn test_original_fallback_can_succeed() {
    let source = heic_source();
    let original = source.data().to_vec();
    let reader = ScriptedReader::new(move |_: usize, payload: &[u8]| {
        (payload == original.as_slice()).then(|| "0012345678905".to_string())
    });
    let converter = StubConverter::converting_to(label_photo(640, 480));

    let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default());
    let (outcome, log) = pipeline.decode_traced(source);

    assert!(outcome.is_success());
    assert_eq!(log.len(), VARIANT_COUNT + 2);
    assert_eq!(log.attempts().last().unwrap().stage, AttemptStage::RawOriginal);
}

#[test]
fn test_identical_inputs_give_identical_traces() {
    let run = || {
        let reader =
            ScriptedReader::new(|call: usize, _: &[u8]| (call == 9).then(|| "X-99".to_string()));
        let detector = FixedDetector::empty();
        let converter = StubConverter::failing();
        let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default())
            .with_detector(Some(&detector));
        let (outcome, log) = pipeline.decode_traced(jpeg_source());
        (outcome.into_result().unwrap(), log)
    };

    let (first_barcode, first_log) = run();
    let (second_barcode, second_log) = run();
    assert_eq!(first_barcode, second_barcode);
    assert_eq!(first_log, second_log);
}

#[test]
fn test_attempts_are_bounded_for_any_input() {
    let inputs = vec![
        SourceImage::new(Vec::new(), ""),
        SourceImage::new(vec![0xFF; 32], "image/png"),
        heic_source(),
        jpeg_source(),
    ];

    for input in inputs {
        let reader = failing_reader();
        let detector = FixedDetector::empty();
        let converter = StubConverter::converting_to(label_photo(300, 200));
        let pipeline = Pipeline::new(&reader, &converter, TransformSettings::default())
            .with_detector(Some(&detector));

        let (outcome, log) = pipeline.decode_traced(input);
        assert!(!outcome.is_success());
        assert!(log.len() <= MAX_ATTEMPTS);
    }
}

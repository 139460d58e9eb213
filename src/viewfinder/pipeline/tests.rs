use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::viewfinder::capture::{
    BracketPlan, CancellationToken, CaptureMode, EncodedStillDecoder, ExposureActuator, ExposureControl,
    ExposureRange, SoftwareActuator, StillCapture, StillDecoder, StillEncoding,
};
use crate::viewfinder::common::error::{Result, ViewfinderError};
use crate::viewfinder::hdr::{RgbaImageData, ToneMapper, merge};
use crate::viewfinder::pipeline::{CaptureConfig, CapturePipeline, PipelineTimings, Timer};
use crate::viewfinder::sink::{CaptureSink, DirectorySink, OutputFormat, OutputHint, StoredCapture, TiffCompression};

struct MockCamera {
    fail: bool,
    cancel_on_call: Option<CancellationToken>,
    calls: usize,
}

impl MockCamera {
    fn new() -> Self {
        Self {
            fail: false,
            cancel_on_call: None,
            calls: 0,
        }
    }
}

impl StillCapture for MockCamera {
    fn capture_still(&mut self, exposure_index: i32, staging: &Path) -> Result<()> {
        self.calls += 1;
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        if self.fail {
            return Err(ViewfinderError::CaptureFailed("Mock capture error".to_string()));
        }
        let level = (100 + exposure_index * 30).clamp(0, 255) as u8;
        RgbaImage::from_pixel(8, 6, Rgba([level, level / 2, 255 - level, 255]))
            .save_with_format(staging, ImageFormat::Png)
            .map_err(|e| ViewfinderError::CaptureFailed(e.to_string()))
    }
}

#[derive(Clone, Default)]
struct MockSink {
    should_fail: bool,
    stored: Arc<Mutex<Vec<(OutputHint, RgbaImageData)>>>,
}

impl CaptureSink for MockSink {
    fn store(&self, image: &RgbaImageData, hint: &OutputHint) -> Result<StoredCapture> {
        if self.should_fail {
            return Err(ViewfinderError::OutputWriteError("Mock write error".to_string()));
        }
        self.stored.lock().unwrap().push((hint.clone(), image.clone()));
        Ok(StoredCapture {
            path: Path::new("/mock").join(&hint.file_name),
            mime_type: hint.mime_type.clone(),
            width: image.width,
            height: image.height,
        })
    }
}

/// Accepts every index except the neutral one.
struct StuckActuator {
    index: i32,
}

impl ExposureActuator for StuckActuator {
    fn exposure_range(&self) -> Option<ExposureRange> {
        Some(ExposureRange::new(-2, 2))
    }

    fn exposure_index(&self) -> i32 {
        self.index
    }

    fn set_exposure_index(&mut self, index: i32) -> Result<()> {
        if index == 0 {
            return Err(ViewfinderError::ActuatorError("Mock actuator error".to_string()));
        }
        self.index = index;
        Ok(())
    }
}

/// Decodes every still into an image whose buffer is one pixel short.
struct TruncatingDecoder;

impl StillDecoder for TruncatingDecoder {
    fn decode(&self, data: &[u8]) -> Result<RgbaImageData> {
        let mut image = EncodedStillDecoder.decode(data)?;
        image.data.truncate(image.data.len() - 4);
        Ok(image)
    }

    fn staging_suffix(&self) -> &'static str {
        ".png"
    }
}

fn exposure() -> ExposureControl<SoftwareActuator> {
    ExposureControl::new(SoftwareActuator::new(Some(ExposureRange::new(-2, 2))))
}

fn pipeline(
    camera: MockCamera,
    sink: MockSink,
) -> CapturePipeline<MockCamera, EncodedStillDecoder, MockSink> {
    CapturePipeline::with_custom(camera, EncodedStillDecoder, sink, CaptureConfig::default())
}

fn shot(level: u8) -> RgbaImageData {
    RgbaImageData::filled(8, 6, [level, level / 2, 255 - level, 255])
}

#[test]
fn test_config_builder() {
    let config = CaptureConfig::builder()
        .bracket(BracketPlan::new(vec![-1, 1], 0))
        .still_encoding(StillEncoding::Raw)
        .output(OutputFormat::Tiff {
            compression: TiffCompression::DeflateBalanced,
            predictor: None,
        })
        .validate_dimensions(false)
        .build();

    assert_eq!(config.bracket.offsets, vec![-1, 1]);
    assert_eq!(config.still_encoding, StillEncoding::Raw);
    assert!(matches!(
        config.output,
        OutputFormat::Tiff {
            compression: TiffCompression::DeflateBalanced,
            predictor: None
        }
    ));
    assert!(!config.validate_dimensions);
    assert_eq!(config.staging_dir, None);

    let default = CaptureConfig::default();
    assert_eq!(default.output, OutputFormat::Jpeg { quality: 95 });
    assert_eq!(default.bracket, BracketPlan::default());
}

#[test]
fn test_hdr_capture_merges_and_tone_maps() {
    let sink = MockSink::default();
    let mut pipeline = pipeline(MockCamera::new(), sink.clone());
    let exposure = exposure();

    let outcome = pipeline
        .capture(CaptureMode::Hdr, &exposure, &CancellationToken::new())
        .unwrap();

    assert_eq!(outcome.shots_requested, 3);
    assert_eq!(outcome.shots_merged, 3);
    assert!(outcome.failures.is_empty());
    assert_eq!(pipeline.camera().calls, 3);
    assert_eq!(exposure.index(), 0);

    let stored = sink.stored.lock().unwrap();
    assert_eq!(stored.len(), 1);
    let (hint, image) = &stored[0];
    assert!(hint.file_name.starts_with("HDR_"));
    assert!(hint.file_name.ends_with(".jpg"));

    let mut expected = merge(&[shot(40), shot(100), shot(160)]).unwrap();
    ToneMapper::new().apply(&mut expected);
    assert_eq!(image, &expected);

    for step in ["bracket", "merge", "tone_map", "store"] {
        assert!(outcome.timings.get_step(step).is_some(), "missing step {step}");
    }
}

#[test]
fn test_failed_restore_reaches_outcome() {
    let sink = MockSink::default();
    let config = CaptureConfig::builder()
        .bracket(BracketPlan::new(vec![-1, 1], 0))
        .build();
    let mut pipeline = CapturePipeline::with_custom(MockCamera::new(), EncodedStillDecoder, sink.clone(), config);
    let exposure = ExposureControl::new(StuckActuator { index: 0 });

    let outcome = pipeline
        .capture(CaptureMode::Hdr, &exposure, &CancellationToken::new())
        .unwrap();

    assert_eq!(outcome.shots_merged, 2);
    assert!(outcome.restore_error.unwrap().contains("Mock actuator error"));
    assert_eq!(exposure.index(), 1);
    assert_eq!(sink.stored.lock().unwrap().len(), 1);
}

#[test]
fn test_restore_error_unset_after_clean_capture() {
    let outcome = pipeline(MockCamera::new(), MockSink::default())
        .capture(CaptureMode::Hdr, &exposure(), &CancellationToken::new())
        .unwrap();
    assert!(outcome.restore_error.is_none());
}

#[test]
fn test_dimension_check_guards_custom_sink() {
    let sink = MockSink::default();
    let mut pipeline =
        CapturePipeline::with_custom(MockCamera::new(), TruncatingDecoder, sink.clone(), CaptureConfig::default());

    let result = pipeline.capture(CaptureMode::Auto, &exposure(), &CancellationToken::new());
    assert!(matches!(result, Err(ViewfinderError::InvalidDimensions(8, 6))));
    assert!(sink.stored.lock().unwrap().is_empty());

    // Without the check the sink is handed the image as decoded
    pipeline.set_config(CaptureConfig::builder().validate_dimensions(false).build());
    pipeline
        .capture(CaptureMode::Auto, &exposure(), &CancellationToken::new())
        .unwrap();
    let stored = sink.stored.lock().unwrap();
    assert_eq!(stored[0].1.data.len(), 8 * 6 * 4 - 4);
}

#[test]
fn test_auto_capture_is_single_unprocessed_shot() {
    let sink = MockSink::default();
    let mut pipeline = pipeline(MockCamera::new(), sink.clone());
    let exposure = exposure();
    exposure.set_index(1).unwrap();

    let outcome = pipeline
        .capture(CaptureMode::Auto, &exposure, &CancellationToken::new())
        .unwrap();

    assert_eq!(outcome.shots_requested, 1);
    assert_eq!(outcome.shots_merged, 1);
    assert_eq!(pipeline.camera().calls, 1);
    assert!(outcome.timings.get_step("merge").is_none());
    assert!(outcome.timings.get_step("tone_map").is_none());

    let stored = sink.stored.lock().unwrap();
    assert!(stored[0].0.file_name.starts_with("IMG_"));
    assert_eq!(stored[0].1, shot(130));
}

#[test]
fn test_unimplemented_modes_fail() {
    let sink = MockSink::default();
    let mut pipeline = pipeline(MockCamera::new(), sink.clone());

    for mode in [CaptureMode::Night, CaptureMode::SuperResolution, CaptureMode::Portrait] {
        let result = pipeline.capture(mode, &exposure(), &CancellationToken::new());
        assert!(matches!(result, Err(ViewfinderError::ModeNotImplemented(m)) if m == mode));
    }
    assert_eq!(pipeline.camera().calls, 0);
    assert!(sink.stored.lock().unwrap().is_empty());
}

#[test]
fn test_all_shots_failed() {
    let sink = MockSink::default();
    let mut camera = MockCamera::new();
    camera.fail = true;
    let mut pipeline = pipeline(camera, sink.clone());

    let result = pipeline.capture(CaptureMode::Hdr, &exposure(), &CancellationToken::new());

    assert!(matches!(result, Err(ViewfinderError::NoShotsCaptured { requested: 3 })));
    assert!(sink.stored.lock().unwrap().is_empty());
}

#[test]
fn test_cancelled_capture_stores_nothing() {
    let staging = tempfile::tempdir().unwrap();
    let token = CancellationToken::new();
    let sink = MockSink::default();
    let mut camera = MockCamera::new();
    camera.cancel_on_call = Some(token.clone());

    let config = CaptureConfig::builder()
        .staging_dir(Some(staging.path().to_path_buf()))
        .build();
    let mut pipeline = CapturePipeline::with_custom(camera, EncodedStillDecoder, sink.clone(), config);
    let exposure = exposure();

    let result = pipeline.capture(CaptureMode::Hdr, &exposure, &token);

    assert!(matches!(result, Err(ViewfinderError::Cancelled)));
    assert_eq!(pipeline.camera().calls, 1);
    assert_eq!(exposure.index(), 0);
    assert!(sink.stored.lock().unwrap().is_empty());
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[test]
fn test_staging_removed_after_capture() {
    let staging = tempfile::tempdir().unwrap();
    let config = CaptureConfig::builder()
        .staging_dir(Some(staging.path().to_path_buf()))
        .build();
    let mut pipeline =
        CapturePipeline::with_custom(MockCamera::new(), EncodedStillDecoder, MockSink::default(), config);

    pipeline
        .capture(CaptureMode::Hdr, &exposure(), &CancellationToken::new())
        .unwrap();
    pipeline
        .capture(CaptureMode::Auto, &exposure(), &CancellationToken::new())
        .unwrap();

    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[test]
fn test_sink_failure_propagates() {
    let sink = MockSink {
        should_fail: true,
        ..Default::default()
    };
    let mut pipeline = pipeline(MockCamera::new(), sink);

    let result = pipeline.capture(CaptureMode::Hdr, &exposure(), &CancellationToken::new());
    assert!(matches!(result, Err(ViewfinderError::OutputWriteError(_))));
}

#[test]
fn test_capture_to_directory() {
    let out = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(out.path()).unwrap();
    let mut pipeline = CapturePipeline::new(MockCamera::new(), sink, CaptureConfig::default());

    let outcome = pipeline
        .capture(CaptureMode::Hdr, &exposure(), &CancellationToken::new())
        .unwrap();

    assert!(outcome.stored.path.starts_with(out.path()));
    assert_eq!(outcome.stored.mime_type, "image/jpeg");
    let name = outcome.stored.path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("HDR_") && name.ends_with(".jpg"));

    let decoded = image::open(&outcome.stored.path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (8, 6));
}

#[test]
fn test_timings() {
    let mut timings = PipelineTimings::new();
    timings.add_step("merge", Duration::from_millis(5));
    timings.add_step("merge", Duration::from_millis(3));
    timings.record(Timer::start("store"));

    assert_eq!(timings.steps().len(), 3);
    assert_eq!(timings.get_step("merge"), Some(Duration::from_millis(8)));
    assert!(timings.get_step("store").is_some());
    assert!(timings.total_duration() >= Duration::from_millis(8));
}

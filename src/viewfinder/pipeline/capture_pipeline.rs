use chrono::Local;
use tracing::{info, instrument, warn};

use crate::viewfinder::capture::{
    BracketCapture, BracketController, BracketPlan, BracketSession, CancellationToken, CaptureMode,
    CaptureStrategy, ExposureActuator, ExposureControl, ShotFailure, StillCapture, StillDecoder,
};
use crate::viewfinder::common::error::{Result, ViewfinderError};
use crate::viewfinder::hdr::{RgbaImageData, ToneMapper, merge};
use crate::viewfinder::pipeline::config::CaptureConfig;
use crate::viewfinder::pipeline::timing::{PipelineTimings, Timer};
use crate::viewfinder::sink::{CaptureSink, OutputHint, StoredCapture};

/// What a successful capture produced.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub stored: StoredCapture,
    pub shots_requested: usize,
    /// Shots that went into the stored image
    pub shots_merged: usize,
    pub failures: Vec<ShotFailure>,
    /// Set when the exposure was left off its neutral index after the bracket
    pub restore_error: Option<String>,
    pub timings: PipelineTimings,
}

pub struct CapturePipeline<C: StillCapture, D: StillDecoder, S: CaptureSink> {
    camera: C,
    decoder: D,
    sink: S,
    tone_mapper: ToneMapper,
    config: CaptureConfig,
}

impl<C: StillCapture, S: CaptureSink> CapturePipeline<C, Box<dyn StillDecoder + Send>, S> {
    /// Pipeline decoding stills as selected by `config.still_encoding`.
    pub fn new(camera: C, sink: S, config: CaptureConfig) -> Self {
        let decoder = config.still_encoding.decoder();
        Self::with_custom(camera, decoder, sink, config)
    }
}

impl<C: StillCapture, D: StillDecoder, S: CaptureSink> CapturePipeline<C, D, S> {
    pub fn with_custom(camera: C, decoder: D, sink: S, config: CaptureConfig) -> Self {
        Self {
            camera,
            decoder,
            sink,
            tone_mapper: ToneMapper::default(),
            config,
        }
    }

    pub fn with_tone_mapper(mut self, tone_mapper: ToneMapper) -> Self {
        self.tone_mapper = tone_mapper;
        self
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CaptureConfig) {
        self.config = config;
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs one capture request in `mode`.
    ///
    /// Every call stages its stills in a fresh session that is removed before
    /// returning. Nothing is stored when the request fails or is cancelled.
    #[instrument(skip_all, fields(mode = %mode))]
    pub fn capture<A: ExposureActuator>(
        &mut self,
        mode: CaptureMode,
        exposure: &ExposureControl<A>,
        cancel: &CancellationToken,
    ) -> Result<CaptureOutcome> {
        let strategy = mode.strategy(&self.config.bracket);
        if let CaptureStrategy::NotImplemented(mode) = strategy {
            warn!("Capture mode has no processing");
            return Err(ViewfinderError::ModeNotImplemented(mode));
        }

        let mut timings = PipelineTimings::new();
        info!("Starting capture");

        let session = match &self.config.staging_dir {
            Some(dir) => BracketSession::in_dir(dir, cancel.clone())?,
            None => BracketSession::new(cancel.clone())?,
        };

        let timer = Timer::start("bracket");
        let bracket = self.run_strategy(&strategy, exposure, &session)?;
        timings.record(timer);

        let BracketCapture {
            targets,
            images,
            failures,
            restore_error,
        } = bracket;
        let shots_requested = targets.len();
        if images.is_empty() {
            warn!(shots_requested, "No shot captured");
            return Err(ViewfinderError::NoShotsCaptured {
                requested: shots_requested,
            });
        }
        session.cancellation().check()?;

        let (image, shots_merged) = match strategy {
            CaptureStrategy::ExposureBracket(_) => {
                let shots_merged = images
                    .iter()
                    .filter(|image| image.same_dimensions(&images[0]))
                    .count();

                let timer = Timer::start("merge");
                let mut merged = merge(&images)?;
                timings.record(timer);

                let timer = Timer::start("tone_map");
                self.tone_mapper.apply(&mut merged);
                timings.record(timer);

                (merged, shots_merged)
            }
            _ => {
                let mut images = images;
                (images.swap_remove(0), 1)
            }
        };

        self.validate_dimensions(&image)?;

        let timer = Timer::start("store");
        let hint = OutputHint::timestamped(mode.file_prefix(), self.config.output, &Local::now());
        let stored = self.sink.store(&image, &hint)?;
        timings.record(timer);

        if let Err(e) = session.close() {
            warn!(error = %e, "Failed to remove staging directory");
        }

        info!(
            path = %stored.path.display(),
            shots_requested,
            shots_merged,
            failed = failures.len(),
            "Capture complete: {}x{} in {:.3}ms",
            stored.width,
            stored.height,
            timings.total_duration().as_secs_f64() * 1000.0
        );
        timings.log_summary();

        Ok(CaptureOutcome {
            stored,
            shots_requested,
            shots_merged,
            failures,
            restore_error,
            timings,
        })
    }

    fn run_strategy<A: ExposureActuator>(
        &mut self,
        strategy: &CaptureStrategy,
        exposure: &ExposureControl<A>,
        session: &BracketSession,
    ) -> Result<BracketCapture> {
        match strategy {
            CaptureStrategy::ExposureBracket(plan) => {
                BracketController::new(plan.clone(), &self.decoder).capture_bracket(
                    exposure,
                    &mut self.camera,
                    session,
                )
            }
            CaptureStrategy::SingleShot => BracketController::new(BracketPlan::new(vec![0], 0), &self.decoder)
                .capture_single(exposure, &mut self.camera, session),
            CaptureStrategy::NotImplemented(mode) => Err(ViewfinderError::ModeNotImplemented(*mode)),
        }
    }

    fn validate_dimensions(&self, image: &RgbaImageData) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }
        image.validate()
    }
}

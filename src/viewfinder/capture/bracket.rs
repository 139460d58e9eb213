use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::viewfinder::capture::actuator::{ExposureActuator, ExposureControl, ExposureRange};
use crate::viewfinder::capture::decode::StillDecoder;
use crate::viewfinder::capture::session::BracketSession;
use crate::viewfinder::common::error::{Result, ViewfinderError};
use crate::viewfinder::hdr::DecodedImage;

/// Single-shot still capture.
pub trait StillCapture {
    /// Takes one still at the exposure index already applied to the actuator
    /// and writes the encoded result to `staging`.
    fn capture_still(&mut self, exposure_index: i32, staging: &Path) -> Result<()>;
}

/// Exposure offsets of a bracket, relative to a neutral index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketPlan {
    pub offsets: Vec<i32>,
    pub neutral: i32,
}

impl Default for BracketPlan {
    fn default() -> Self {
        Self {
            offsets: vec![-2, 0, 2],
            neutral: 0,
        }
    }
}

impl BracketPlan {
    pub fn new(offsets: Vec<i32>, neutral: i32) -> Self {
        Self { offsets, neutral }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Index commanded for each shot. Every offset is clamped on its own, so
    /// a narrow range can map several offsets to the same index; those shots
    /// are all kept. Without a range every shot stays at the neutral index.
    pub fn targets(&self, range: Option<ExposureRange>) -> Vec<i32> {
        self.offsets
            .iter()
            .map(|&offset| match range {
                Some(range) => range.clamp(self.neutral.saturating_add(offset)),
                None => self.neutral,
            })
            .collect()
    }
}

/// A shot dropped from the bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotFailure {
    pub shot: usize,
    pub exposure_index: i32,
    pub reason: String,
}

/// Result of one bracket sequence.
#[derive(Debug, Clone, Default)]
pub struct BracketCapture {
    /// Index commanded for each shot, in order
    pub targets: Vec<i32>,
    /// Decoded stills of the successful shots, in shot order
    pub images: Vec<DecodedImage>,
    pub failures: Vec<ShotFailure>,
    /// Set when the neutral index could not be put back after the bracket
    pub restore_error: Option<String>,
}

impl BracketCapture {
    pub fn requested(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Drives the actuator through a bracket plan and collects decoded stills.
pub struct BracketController<D: StillDecoder> {
    plan: BracketPlan,
    decoder: D,
}

impl<D: StillDecoder> BracketController<D> {
    pub fn new(plan: BracketPlan, decoder: D) -> Self {
        Self { plan, decoder }
    }

    pub fn plan(&self) -> &BracketPlan {
        &self.plan
    }

    /// Runs the whole bracket with the actuator held exclusively.
    ///
    /// A failed shot is recorded and skipped; the sequence goes on with the
    /// next offset. The neutral index is restored afterwards whatever
    /// happened, cancellation included. A failed restore is reported in
    /// [`BracketCapture::restore_error`].
    #[instrument(skip_all, fields(shots = self.plan.len()))]
    pub fn capture_bracket<A, C>(
        &self,
        exposure: &ExposureControl<A>,
        camera: &mut C,
        session: &BracketSession,
    ) -> Result<BracketCapture>
    where
        A: ExposureActuator,
        C: StillCapture + ?Sized,
    {
        session.cancellation().check()?;

        let mut guard = exposure.acquire_for_bracket(self.plan.neutral);
        let targets = self.plan.targets(guard.range());
        info!(?targets, range = ?guard.range(), "Starting exposure bracket");

        let mut capture = BracketCapture {
            targets: targets.clone(),
            ..Default::default()
        };

        for (shot, &target) in targets.iter().enumerate() {
            if session.is_cancelled() {
                info!(shot, "Bracket cancelled");
                return Err(ViewfinderError::Cancelled);
            }

            let result = guard
                .apply(target)
                .and_then(|_| self.capture_shot(camera, session, shot, target));

            match result {
                Ok(image) => {
                    debug!(shot, target, width = image.width, height = image.height, "Shot captured");
                    capture.images.push(image);
                }
                Err(e) => {
                    warn!(shot, target, error = %e, "Shot failed, continuing bracket");
                    capture.failures.push(ShotFailure {
                        shot,
                        exposure_index: target,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Err(e) = guard.restore() {
            warn!(error = %e, "Failed to restore neutral exposure after bracket");
            capture.restore_error = Some(e.to_string());
        }

        info!(
            captured = capture.images.len(),
            failed = capture.failures.len(),
            "Exposure bracket complete"
        );
        Ok(capture)
    }

    /// One still at whatever exposure the device currently has.
    pub fn capture_single<A, C>(
        &self,
        exposure: &ExposureControl<A>,
        camera: &mut C,
        session: &BracketSession,
    ) -> Result<BracketCapture>
    where
        A: ExposureActuator,
        C: StillCapture + ?Sized,
    {
        session.cancellation().check()?;

        let index = exposure.index();
        let mut capture = BracketCapture {
            targets: vec![index],
            ..Default::default()
        };

        match self.capture_shot(camera, session, 0, index) {
            Ok(image) => capture.images.push(image),
            Err(e) => {
                warn!(index, error = %e, "Single shot failed");
                capture.failures.push(ShotFailure {
                    shot: 0,
                    exposure_index: index,
                    reason: e.to_string(),
                });
            }
        }
        Ok(capture)
    }

    /// Captures into a staging file and decodes it. The staging file is gone
    /// when this returns, on success or failure.
    fn capture_shot<C: StillCapture + ?Sized>(
        &self,
        camera: &mut C,
        session: &BracketSession,
        shot: usize,
        target: i32,
    ) -> Result<DecodedImage> {
        let staged = session.stage(shot, self.decoder.staging_suffix())?;

        camera.capture_still(target, &staged)?;
        let bytes = std::fs::read(&staged)?;
        session.discard(staged);

        self.decoder.decode(&bytes)
    }
}

//! Exposure compensation control.
//!
//! The actuator is the one device both the interactive controls and the
//! bracket sequence touch. `ExposureControl` shares it; a bracket takes it
//! exclusively through `BracketExposureGuard`, which puts the neutral index
//! back when it goes away.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use tracing::{debug, warn};

use crate::viewfinder::common::error::{Result, ViewfinderError};

/// Inclusive range of exposure compensation indices reported by a device.
///
/// Nothing guarantees `lower <= 0 <= upper`, or even `lower <= upper`; the
/// range is read from the device and used as reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureRange {
    pub lower: i32,
    pub upper: i32,
}

impl ExposureRange {
    pub fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    /// `max(lower, min(upper, index))`. Does not panic on an inverted range.
    pub fn clamp(&self, index: i32) -> i32 {
        self.lower.max(self.upper.min(index))
    }

    pub fn contains(&self, index: i32) -> bool {
        self.lower <= index && index <= self.upper
    }
}

/// Exposure compensation device.
pub trait ExposureActuator: Send {
    /// `None` when the device does not support exposure compensation.
    fn exposure_range(&self) -> Option<ExposureRange>;

    fn exposure_index(&self) -> i32;

    fn set_exposure_index(&mut self, index: i32) -> Result<()>;
}

/// In-memory actuator: stores the commanded index and the history of commands.
#[derive(Debug, Clone, Default)]
pub struct SoftwareActuator {
    range: Option<ExposureRange>,
    index: i32,
    history: Vec<i32>,
}

impl SoftwareActuator {
    pub fn new(range: Option<ExposureRange>) -> Self {
        Self {
            range,
            index: 0,
            history: Vec::new(),
        }
    }

    /// Every index commanded so far, oldest first.
    pub fn history(&self) -> &[i32] {
        &self.history
    }
}

impl ExposureActuator for SoftwareActuator {
    fn exposure_range(&self) -> Option<ExposureRange> {
        self.range
    }

    fn exposure_index(&self) -> i32 {
        self.index
    }

    fn set_exposure_index(&mut self, index: i32) -> Result<()> {
        match self.range {
            Some(range) if range.contains(index) => {
                self.index = index;
                self.history.push(index);
                Ok(())
            }
            Some(range) => Err(ViewfinderError::ActuatorError(format!(
                "index {} outside [{}, {}]",
                index, range.lower, range.upper
            ))),
            None => Err(ViewfinderError::ActuatorError(
                "exposure compensation not supported".to_string(),
            )),
        }
    }
}

/// Shared handle to the exposure actuator.
pub struct ExposureControl<A: ExposureActuator> {
    device: Arc<Mutex<A>>,
}

impl<A: ExposureActuator> Clone for ExposureControl<A> {
    fn clone(&self) -> Self {
        Self {
            device: Arc::clone(&self.device),
        }
    }
}

impl<A: ExposureActuator> ExposureControl<A> {
    pub fn new(actuator: A) -> Self {
        Self {
            device: Arc::new(Mutex::new(actuator)),
        }
    }

    // The actuator holds no invariant a panicking holder could break halfway.
    fn lock(&self) -> MutexGuard<'_, A> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn range(&self) -> Option<ExposureRange> {
        self.lock().exposure_range()
    }

    pub fn index(&self) -> i32 {
        self.lock().exposure_index()
    }

    /// Interactive adjustment. The index is clamped into the device range and
    /// the applied value returned. A device without exposure support is left
    /// untouched. Fails instead of waiting while a bracket holds the device.
    pub fn set_index(&self, index: i32) -> Result<i32> {
        let mut device = match self.device.try_lock() {
            Ok(device) => device,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return Err(ViewfinderError::ActuatorError(
                    "exposure is held by a bracket capture".to_string(),
                ));
            }
        };

        let Some(range) = device.exposure_range() else {
            debug!("Exposure compensation unsupported, ignoring adjustment");
            return Ok(device.exposure_index());
        };

        let applied = range.clamp(index);
        device.set_exposure_index(applied)?;
        Ok(applied)
    }

    /// Takes exclusive control of the device for a bracket sequence. The
    /// returned guard restores `neutral` (clamped into the range read here)
    /// when it is dropped or explicitly restored.
    pub fn acquire_for_bracket(&self, neutral: i32) -> BracketExposureGuard<'_, A> {
        let device = self.lock();
        let range = device.exposure_range();
        let neutral = range.map_or(neutral, |r| r.clamp(neutral));
        BracketExposureGuard {
            device,
            range,
            neutral,
            restored: false,
        }
    }

    /// Runs `f` with the device locked.
    pub fn with_device<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut self.lock())
    }
}

/// Exclusive, ordered access to the actuator for the length of one bracket.
pub struct BracketExposureGuard<'a, A: ExposureActuator> {
    device: MutexGuard<'a, A>,
    range: Option<ExposureRange>,
    neutral: i32,
    restored: bool,
}

impl<A: ExposureActuator> BracketExposureGuard<'_, A> {
    /// Range read when the guard was acquired.
    pub fn range(&self) -> Option<ExposureRange> {
        self.range
    }

    pub fn neutral(&self) -> i32 {
        self.neutral
    }

    /// Commands `index`. No-op on a device without exposure support.
    pub fn apply(&mut self, index: i32) -> Result<()> {
        if self.range.is_none() {
            return Ok(());
        }
        debug!(index, "Applying bracket exposure");
        self.device.set_exposure_index(index)
    }

    /// Puts the neutral index back and releases the device.
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.restore_neutral()
    }

    fn restore_neutral(&mut self) -> Result<()> {
        if self.range.is_none() {
            return Ok(());
        }
        debug!(index = self.neutral, "Restoring neutral exposure");
        self.device.set_exposure_index(self.neutral)
    }
}

impl<A: ExposureActuator> Drop for BracketExposureGuard<'_, A> {
    fn drop(&mut self) {
        if !self.restored {
            if let Err(e) = self.restore_neutral() {
                warn!(error = %e, "Failed to restore neutral exposure");
            }
        }
    }
}

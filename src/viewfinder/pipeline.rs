//! Capture pipeline module
//!
//! Runs a capture request end to end: bracket (or single shot), merge,
//! tone map and store, timing every step.

mod config;
mod timing;
mod capture_pipeline;

#[cfg(test)]
mod tests;

pub use config::{CaptureConfig, CaptureConfigBuilder};
pub use timing::{PipelineTimings, StepTiming, Timer};
pub use capture_pipeline::{CaptureOutcome, CapturePipeline};

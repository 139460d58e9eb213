//! Viewfinder analysis and capture module
//!
//! Per-frame analysis (histogram, zebra, focus peaking) runs on a dedicated
//! worker fed by a single-slot frame exchange. The capture side drives an
//! exposure bracket, merges the shots, tone-maps the result and hands it to a sink.

pub mod common;
pub mod frame;
pub mod analysis;
pub mod worker;
pub mod capture;
pub mod hdr;
pub mod sink;
pub mod pipeline;

pub use common::{
    ViewfinderError,
    Result,
};

pub use frame::{
    LumaFrame,
    LumaBuffer,
};

pub use analysis::{
    AnalysisConfig,
    AnalysisConfigBuilder,
    AnalysisGrid,
    FrameAnalysis,
    FrameAnalyzer,
    Histogram,
    HistogramAnalyzer,
    ZebraPeakingAnalyzer,
};

pub use worker::{
    AnalysisWorker,
    LatestFrameSlot,
};

pub use capture::{
    BracketCapture,
    BracketController,
    BracketPlan,
    BracketSession,
    CancellationToken,
    CaptureMode,
    CaptureStrategy,
    EncodedStillDecoder,
    ExposureActuator,
    ExposureControl,
    ExposureRange,
    RawStillDecoder,
    ShotFailure,
    SoftwareActuator,
    StillCapture,
    StillDecoder,
    StillEncoding,
};

pub use hdr::{
    DecodedImage,
    MergedImage,
    RgbaImageData,
    ToneMapper,
    merge,
};

pub use sink::{
    CaptureSink,
    DirectorySink,
    OutputFormat,
    OutputHint,
    StoredCapture,
    TiffCompression,
};

pub use pipeline::{
    CaptureConfig,
    CaptureConfigBuilder,
    CaptureOutcome,
    CapturePipeline,
    PipelineTimings,
    StepTiming,
    Timer,
};

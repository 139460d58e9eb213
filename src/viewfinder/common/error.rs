use thiserror::Error;

use crate::viewfinder::capture::CaptureMode;

#[derive(Error, Debug)]
pub enum ViewfinderError {
    #[error("Malformed luma frame: {0}")]
    MalformedFrame(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(u32, u32),

    #[error("Failed to decode captured still: {0}")]
    DecodeError(String),

    #[error("Failed to encode output image: {0}")]
    EncodeError(String),

    #[error("Still capture failed: {0}")]
    CaptureFailed(String),

    #[error("Exposure actuator error: {0}")]
    ActuatorError(String),

    #[error("Merge requires at least one captured image")]
    EmptyMerge,

    #[error("No shot of the {requested}-shot sequence was captured")]
    NoShotsCaptured { requested: usize },

    #[error("Capture cancelled")]
    Cancelled,

    #[error("Capture mode {0} is not implemented")]
    ModeNotImplemented(CaptureMode),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ViewfinderError>;

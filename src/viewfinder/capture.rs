//! Still capture module
//!
//! Exposure control, bracketed capture with staged stills, still decoding
//! and the capture-mode selection that picks a capture strategy.

mod actuator;
mod bracket;
mod session;
mod decode;
mod debayer;
mod mode;


pub use actuator::{BracketExposureGuard, ExposureActuator, ExposureControl, ExposureRange, SoftwareActuator};
pub use bracket::{BracketCapture, BracketController, BracketPlan, ShotFailure, StillCapture};
pub use session::{BracketSession, CancellationToken};
pub use decode::{EncodedStillDecoder, RawStillDecoder, StillDecoder, StillEncoding};
pub use debayer::{CpuDebayer, RawFrame};
pub use mode::{CaptureMode, CaptureStrategy};

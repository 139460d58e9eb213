use std::fmt;

use crate::viewfinder::capture::bracket::BracketPlan;

/// User-selectable capture mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureMode {
    /// One still at the current exposure
    Auto,
    /// Exposure bracket merged into one image
    #[default]
    Hdr,
    Night,
    SuperResolution,
    Portrait,
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureMode::Auto => "auto",
            CaptureMode::Hdr => "hdr",
            CaptureMode::Night => "night",
            CaptureMode::SuperResolution => "super-resolution",
            CaptureMode::Portrait => "portrait",
        };
        f.write_str(name)
    }
}

/// What a capture request actually does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStrategy {
    SingleShot,
    ExposureBracket(BracketPlan),
    /// The mode has no processing yet; it must not silently pass data through.
    NotImplemented(CaptureMode),
}

impl CaptureMode {
    pub fn strategy(self, plan: &BracketPlan) -> CaptureStrategy {
        match self {
            CaptureMode::Auto => CaptureStrategy::SingleShot,
            CaptureMode::Hdr => CaptureStrategy::ExposureBracket(plan.clone()),
            CaptureMode::Night | CaptureMode::SuperResolution | CaptureMode::Portrait => {
                CaptureStrategy::NotImplemented(self)
            }
        }
    }

    /// Prefix of output file names.
    pub fn file_prefix(self) -> &'static str {
        match self {
            CaptureMode::Hdr => "HDR",
            _ => "IMG",
        }
    }
}

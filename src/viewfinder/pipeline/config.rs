use std::path::PathBuf;

use crate::viewfinder::capture::{BracketPlan, StillEncoding};
use crate::viewfinder::sink::OutputFormat;

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub bracket: BracketPlan,
    pub still_encoding: StillEncoding,
    pub output: OutputFormat,
    /// Parent of per-capture staging directories; the system temp dir if unset
    pub staging_dir: Option<PathBuf>,
    /// Checks the final image before it is handed to the sink. `DirectorySink`
    /// checks on its own, so turning this off only changes what a custom
    /// [`CaptureSink`](crate::viewfinder::sink::CaptureSink) may receive.
    pub validate_dimensions: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            bracket: BracketPlan::default(),
            still_encoding: StillEncoding::Encoded,
            output: OutputFormat::default(),
            staging_dir: None,
            validate_dimensions: true,
        }
    }
}

impl CaptureConfig {
    pub fn builder() -> CaptureConfigBuilder {
        CaptureConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct CaptureConfigBuilder {
    bracket: Option<BracketPlan>,
    still_encoding: Option<StillEncoding>,
    output: Option<OutputFormat>,
    staging_dir: Option<Option<PathBuf>>,
    validate_dimensions: Option<bool>,
}

impl CaptureConfigBuilder {
    pub fn bracket(mut self, bracket: BracketPlan) -> Self {
        self.bracket = Some(bracket);
        self
    }

    pub fn still_encoding(mut self, encoding: StillEncoding) -> Self {
        self.still_encoding = Some(encoding);
        self
    }

    pub fn output(mut self, output: OutputFormat) -> Self {
        self.output = Some(output);
        self
    }

    pub fn staging_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.staging_dir = Some(dir);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn build(self) -> CaptureConfig {
        let default = CaptureConfig::default();
        CaptureConfig {
            bracket: self.bracket.unwrap_or(default.bracket),
            still_encoding: self.still_encoding.unwrap_or(default.still_encoding),
            output: self.output.unwrap_or(default.output),
            staging_dir: self.staging_dir.unwrap_or(default.staging_dir),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
        }
    }
}

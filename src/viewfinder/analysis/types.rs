//! Analysis configuration types

/// Configuration for the per-frame analyzers
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Number of zebra/peaking cells across the frame
    pub grid_width: u32,
    /// Number of zebra/peaking cells down the frame
    pub grid_height: u32,
    /// Mean luma at or above which a cell is flagged as overexposed
    pub zebra_threshold: u8,
    /// Mean gradient magnitude at or above which a cell is highlighted as in focus
    pub peaking_threshold: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            grid_width: 64,
            grid_height: 36,
            zebra_threshold: 250,
            peaking_threshold: 24.0,
        }
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }
}

/// Builder for AnalysisConfig
#[derive(Default)]
pub struct AnalysisConfigBuilder {
    grid_width: Option<u32>,
    grid_height: Option<u32>,
    zebra_threshold: Option<u8>,
    peaking_threshold: Option<f32>,
}

impl AnalysisConfigBuilder {
    pub fn grid(mut self, width: u32, height: u32) -> Self {
        self.grid_width = Some(width);
        self.grid_height = Some(height);
        self
    }

    pub fn zebra_threshold(mut self, threshold: u8) -> Self {
        self.zebra_threshold = Some(threshold);
        self
    }

    pub fn peaking_threshold(mut self, threshold: f32) -> Self {
        self.peaking_threshold = Some(threshold);
        self
    }

    pub fn build(self) -> AnalysisConfig {
        let default = AnalysisConfig::default();
        AnalysisConfig {
            grid_width: self.grid_width.unwrap_or(default.grid_width),
            grid_height: self.grid_height.unwrap_or(default.grid_height),
            zebra_threshold: self.zebra_threshold.unwrap_or(default.zebra_threshold),
            peaking_threshold: self.peaking_threshold.unwrap_or(default.peaking_threshold),
        }
    }
}

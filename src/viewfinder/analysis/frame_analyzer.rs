use tracing::warn;

use crate::viewfinder::analysis::grid::AnalysisGrid;
use crate::viewfinder::analysis::histogram::{Histogram, HistogramAnalyzer};
use crate::viewfinder::analysis::types::AnalysisConfig;
use crate::viewfinder::analysis::zebra_peaking::ZebraPeakingAnalyzer;
use crate::viewfinder::frame::{LumaBuffer, LumaFrame};

/// Everything the overlays consume for one frame.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    /// Sequence number of the analyzed frame
    pub sequence: u64,
    pub histogram: Histogram,
    pub zebra: AnalysisGrid<bool>,
    pub peaking: AnalysisGrid<f32>,
    /// Cells whose peaking energy reaches the configured threshold
    pub peaking_highlights: AnalysisGrid<bool>,
}

impl FrameAnalysis {
    pub fn new(grid_width: u32, grid_height: u32) -> Self {
        Self {
            sequence: 0,
            histogram: Histogram::default(),
            zebra: AnalysisGrid::new(grid_width, grid_height),
            peaking: AnalysisGrid::new(grid_width, grid_height),
            peaking_highlights: AnalysisGrid::new(grid_width, grid_height),
        }
    }

    /// Resets every output to its zero value.
    fn zero(&mut self) {
        self.histogram.clear();
        self.zebra.cells_mut().fill(false);
        self.peaking.cells_mut().fill(0.0);
        self.peaking_highlights.cells_mut().fill(false);
    }
}

/// Runs the histogram and zebra/peaking analyzers over one frame.
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    config: AnalysisConfig,
    histogram: HistogramAnalyzer,
    zebra_peaking: ZebraPeakingAnalyzer,
}

impl FrameAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            histogram: HistogramAnalyzer,
            zebra_peaking: ZebraPeakingAnalyzer::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Output buffers sized for this analyzer's grid.
    pub fn new_analysis(&self) -> FrameAnalysis {
        FrameAnalysis::new(self.config.grid_width, self.config.grid_height)
    }

    pub fn analyze(&self, frame: &LumaFrame<'_>) -> FrameAnalysis {
        let mut analysis = self.new_analysis();
        self.analyze_into(frame, &mut analysis);
        analysis
    }

    pub fn analyze_into(&self, frame: &LumaFrame<'_>, analysis: &mut FrameAnalysis) {
        self.histogram.compute_into(frame, &mut analysis.histogram);
        self.zebra_peaking.compute_into(
            frame,
            self.config.grid_width,
            self.config.grid_height,
            &mut analysis.zebra,
            &mut analysis.peaking,
        );
        self.zebra_peaking
            .peaking_highlights_into(&analysis.peaking, &mut analysis.peaking_highlights);
    }

    /// Analyzes an owned buffer. A malformed buffer yields a zero-valued
    /// analysis instead of an error.
    pub fn analyze_buffer(&self, buffer: &LumaBuffer, analysis: &mut FrameAnalysis) {
        analysis.sequence = buffer.sequence;
        match buffer.view() {
            Ok(frame) => self.analyze_into(&frame, analysis),
            Err(e) => {
                warn!(sequence = buffer.sequence, error = %e, "Skipping malformed frame");
                analysis.zebra.reshape(self.config.grid_width, self.config.grid_height);
                analysis.peaking.reshape(self.config.grid_width, self.config.grid_height);
                analysis.peaking_highlights.reshape(self.config.grid_width, self.config.grid_height);
                analysis.zero();
            }
        }
    }
}

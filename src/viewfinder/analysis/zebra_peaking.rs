use tracing::{debug, trace};

use crate::viewfinder::analysis::grid::AnalysisGrid;
use crate::viewfinder::analysis::types::AnalysisConfig;
use crate::viewfinder::frame::LumaFrame;

/// Sampling step inside a cell, in both axes.
const CELL_SAMPLE_STEP: usize = 2;

/// Computes the zebra (overexposure) and focus-peaking grids of a frame.
///
/// Each grid cell covers `max(1, width / grid_width)` by
/// `max(1, height / grid_height)` pixels, with the remainder folded into the
/// last column and row. Inside a cell every second pixel of every second row
/// is sampled: its luma feeds the cell mean and its Sobel gradient magnitude
/// feeds the peaking energy.
#[derive(Debug, Clone)]
pub struct ZebraPeakingAnalyzer {
    zebra_threshold: u8,
    peaking_threshold: f32,
}

impl Default for ZebraPeakingAnalyzer {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl ZebraPeakingAnalyzer {
    pub fn new(zebra_threshold: u8, peaking_threshold: f32) -> Self {
        Self {
            zebra_threshold,
            peaking_threshold,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.zebra_threshold, config.peaking_threshold)
    }

    pub fn zebra_threshold(&self) -> u8 {
        self.zebra_threshold
    }

    pub fn peaking_threshold(&self) -> f32 {
        self.peaking_threshold
    }

    pub fn compute(
        &self,
        frame: &LumaFrame<'_>,
        grid_width: u32,
        grid_height: u32,
    ) -> (AnalysisGrid<bool>, AnalysisGrid<f32>) {
        let mut zebra = AnalysisGrid::new(grid_width, grid_height);
        let mut peaking = AnalysisGrid::new(grid_width, grid_height);
        self.compute_into(frame, grid_width, grid_height, &mut zebra, &mut peaking);
        (zebra, peaking)
    }

    /// Same as `compute`, reusing the caller's grids. Every cell of both grids
    /// is assigned exactly once.
    pub fn compute_into(
        &self,
        frame: &LumaFrame<'_>,
        grid_width: u32,
        grid_height: u32,
        zebra: &mut AnalysisGrid<bool>,
        peaking: &mut AnalysisGrid<f32>,
    ) {
        zebra.reshape(grid_width, grid_height);
        peaking.reshape(grid_width, grid_height);

        let cell_w = (frame.width() / grid_width.max(1)).max(1);
        let cell_h = (frame.height() / grid_height.max(1)).max(1);
        let zebra_cells = zebra.cells_mut();
        let peaking_cells = peaking.cells_mut();

        if !frame.pixels_addressable() {
            debug!(
                width = frame.width(),
                row_stride = frame.row_stride(),
                pixel_stride = frame.pixel_stride(),
                "Pixel span exceeds row stride, zeroing zebra/peaking grids"
            );
            zebra_cells.fill(false);
            peaking_cells.fill(0.0);
            return;
        }

        for gy in 0..grid_height {
            let (start_y, end_y) = cell_span(gy, grid_height, cell_h, frame.height());
            for gx in 0..grid_width {
                let (start_x, end_x) = cell_span(gx, grid_width, cell_w, frame.width());

                let mut sum = 0u64;
                let mut count = 0u32;
                let mut gradient = 0.0f32;

                for y in (start_y..end_y).step_by(CELL_SAMPLE_STEP) {
                    for x in (start_x..end_x).step_by(CELL_SAMPLE_STEP) {
                        sum += u64::from(frame.sample(x, y));
                        gradient += sobel_magnitude(frame, x, y);
                        count += 1;
                    }
                }

                let mean = if count > 0 { sum / u64::from(count) } else { 0 };
                let idx = gy as usize * grid_width as usize + gx as usize;
                zebra_cells[idx] = mean >= u64::from(self.zebra_threshold);
                peaking_cells[idx] = gradient / count.max(1) as f32;
            }
        }

        trace!(
            cells = zebra_cells.len(),
            flagged = zebra_cells.iter().filter(|&&z| z).count(),
            "Zebra/peaking grids computed"
        );
    }

    /// Cells whose gradient energy reaches the peaking threshold.
    pub fn peaking_highlights(&self, peaking: &AnalysisGrid<f32>) -> AnalysisGrid<bool> {
        let mut highlights = AnalysisGrid::new(peaking.width(), peaking.height());
        self.peaking_highlights_into(peaking, &mut highlights);
        highlights
    }

    /// Same as `peaking_highlights`, writing into the caller's grid.
    pub fn peaking_highlights_into(&self, peaking: &AnalysisGrid<f32>, highlights: &mut AnalysisGrid<bool>) {
        highlights.reshape(peaking.width(), peaking.height());
        let threshold = self.peaking_threshold;
        for (flag, &magnitude) in highlights.cells_mut().iter_mut().zip(peaking.cells()) {
            *flag = magnitude >= threshold;
        }
    }
}

/// Pixel range `[start, end)` of cell `index` along one axis.
fn cell_span(index: u32, cells: u32, cell_size: u32, extent: u32) -> (u32, u32) {
    let start = index.saturating_mul(cell_size).min(extent);
    let end = if index + 1 == cells {
        extent
    } else {
        start.saturating_add(cell_size).min(extent)
    };
    (start, end)
}

/// 3x3 Sobel gradient magnitude at `(x, y)`, neighbors clamped to the frame.
#[inline]
fn sobel_magnitude(frame: &LumaFrame<'_>, x: u32, y: u32) -> f32 {
    let (x, y) = (i64::from(x), i64::from(y));
    let p = |dx: i64, dy: i64| i32::from(frame.sample_clamped(x + dx, y + dy));

    let (tl, tc, tr) = (p(-1, -1), p(0, -1), p(1, -1));
    let (ml, mr) = (p(-1, 0), p(1, 0));
    let (bl, bc, br) = (p(-1, 1), p(0, 1), p(1, 1));

    let gx = (tr + 2 * mr + br) - (tl + 2 * ml + bl);
    let gy = (tl + 2 * tc + tr) - (bl + 2 * bc + br);
    ((gx * gx + gy * gy) as f32).sqrt()
}

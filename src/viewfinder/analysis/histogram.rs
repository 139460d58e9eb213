use tracing::trace;

use crate::viewfinder::frame::LumaFrame;

/// 256-bucket luminance histogram indexed by 8-bit luma value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u32; 256],
}

impl Default for Histogram {
    fn default() -> Self {
        Self { counts: [0; 256] }
    }
}

impl Histogram {
    pub fn counts(&self) -> &[u32; 256] {
        &self.counts
    }

    pub fn count(&self, value: u8) -> u32 {
        self.counts[usize::from(value)]
    }

    /// Number of samples examined by the last computation.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Bucket heights relative to the tallest bucket, in `[0, 1]`.
    pub fn normalized(&self) -> [f32; 256] {
        let max = self.max_count().max(1) as f32;
        let mut bars = [0.0f32; 256];
        for (bar, &count) in bars.iter_mut().zip(self.counts.iter()) {
            *bar = count as f32 / max;
        }
        bars
    }

    /// Samples at or above `level`.
    pub fn clipped_highlights(&self, level: u8) -> u64 {
        self.counts[usize::from(level)..]
            .iter()
            .map(|&c| u64::from(c))
            .sum()
    }

    pub fn clear(&mut self) {
        self.counts = [0; 256];
    }
}

/// Computes luminance histograms over luma frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct HistogramAnalyzer;

impl HistogramAnalyzer {
    pub fn compute(&self, frame: &LumaFrame<'_>) -> Histogram {
        let mut histogram = Histogram::default();
        self.compute_into(frame, &mut histogram);
        histogram
    }

    /// Every row is sampled; along a row, sample positions step by the pixel
    /// stride and read the byte at that position of the row. Buckets are
    /// reset first, so nothing leaks from the previous frame.
    pub fn compute_into(&self, frame: &LumaFrame<'_>, histogram: &mut Histogram) {
        histogram.clear();
        if frame.is_empty() {
            return;
        }

        let width = frame.width() as usize;
        let step = frame.pixel_stride() as usize;
        for y in 0..frame.height() {
            let row = frame.row(y);
            for &value in row[..width].iter().step_by(step) {
                histogram.counts[usize::from(value)] += 1;
            }
        }

        trace!(samples = histogram.total(), "Histogram computed");
    }

    /// Samples examined for `frame` under the stride rule.
    pub fn sample_count(frame: &LumaFrame<'_>) -> u64 {
        if frame.is_empty() {
            return 0;
        }
        u64::from(frame.height()) * u64::from(frame.width().div_ceil(frame.pixel_stride()))
    }
}

//! Luma plane views handed to the analyzers.

use std::sync::Arc;

use crate::viewfinder::common::error::{Result, ViewfinderError};
use crate::viewfinder::hdr::RgbaImageData;

/// Read-only view of one camera frame's luma plane.
///
/// The view borrows the plane for the duration of an analysis call; the
/// analyzers never keep it past that. Pixel `(x, y)` lives at byte
/// `y * row_stride + x * pixel_stride`.
#[derive(Debug, Clone, Copy)]
pub struct LumaFrame<'a> {
    width: u32,
    height: u32,
    row_stride: u32,
    pixel_stride: u32,
    data: &'a [u8],
}

impl<'a> LumaFrame<'a> {
    /// Creates a view after checking that every row is at least `width`
    /// bytes long and that `data` holds `height` rows of `row_stride` bytes.
    ///
    /// A zero-width or zero-height frame is accepted and analyzes to zero results.
    pub fn new(
        width: u32,
        height: u32,
        row_stride: u32,
        pixel_stride: u32,
        data: &'a [u8],
    ) -> Result<Self> {
        if pixel_stride == 0 {
            return Err(ViewfinderError::MalformedFrame("pixel stride is zero".to_string()));
        }

        if width > 0 && height > 0 {
            if row_stride < width {
                return Err(ViewfinderError::MalformedFrame(format!(
                    "row stride {} is shorter than width {}",
                    row_stride, width
                )));
            }

            let required = u64::from(row_stride) * u64::from(height);
            if (data.len() as u64) < required {
                return Err(ViewfinderError::MalformedFrame(format!(
                    "plane holds {} bytes, {} required for {} rows of stride {}",
                    data.len(),
                    required,
                    height,
                    row_stride
                )));
            }
        }

        Ok(Self {
            width,
            height,
            row_stride,
            pixel_stride,
            data,
        })
    }

    /// Tightly packed plane: one byte per pixel, no row padding.
    pub fn packed(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        Self::new(width, height, width, 1, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row_stride(&self) -> u32 {
        self.row_stride
    }

    pub fn pixel_stride(&self) -> u32 {
        self.pixel_stride
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the last pixel of a row, at `(width - 1) * pixel_stride`,
    /// still lies inside that row. Frames where it does not are valid for
    /// the histogram but have no pixel grid to run spatial analysis on.
    pub fn pixels_addressable(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        u64::from(self.width - 1) * u64::from(self.pixel_stride) < u64::from(self.row_stride)
    }

    /// The `row_stride` bytes starting at row `y`.
    #[inline]
    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = y as usize * self.row_stride as usize;
        &self.data[start..start + self.row_stride as usize]
    }

    /// Luma at pixel `(x, y)`. Addresses past the end of the plane read as 0.
    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> u8 {
        let offset = y as usize * self.row_stride as usize + x as usize * self.pixel_stride as usize;
        self.data.get(offset).copied().unwrap_or(0)
    }

    /// Sample with coordinates clamped to the frame, so border pixels reuse
    /// their nearest in-bounds neighbor. An empty frame reads as 0.
    #[inline]
    pub fn sample_clamped(&self, x: i64, y: i64) -> u8 {
        if self.is_empty() {
            return 0;
        }
        let cx = x.clamp(0, i64::from(self.width) - 1) as u32;
        let cy = y.clamp(0, i64::from(self.height) - 1) as u32;
        self.sample(cx, cy)
    }
}

/// Owned luma plane, as delivered by the frame source to the analysis worker.
#[derive(Debug, Clone)]
pub struct LumaBuffer {
    /// Frame sequence number assigned by the source
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub row_stride: u32,
    pub pixel_stride: u32,
    pub data: Arc<[u8]>,
}

impl LumaBuffer {
    pub fn new(
        sequence: u64,
        width: u32,
        height: u32,
        row_stride: u32,
        pixel_stride: u32,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            sequence,
            width,
            height,
            row_stride,
            pixel_stride,
            data: data.into(),
        }
    }

    pub fn packed(sequence: u64, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self::new(sequence, width, height, width, 1, data)
    }

    /// Derives a packed luma plane from an RGBA still using BT.601 weights.
    pub fn from_rgba(sequence: u64, image: &RgbaImageData) -> Self {
        let luma: Vec<u8> = image
            .data
            .chunks_exact(4)
            .map(|px| {
                let y = 77 * u32::from(px[0]) + 150 * u32::from(px[1]) + 29 * u32::from(px[2]) + 128;
                (y >> 8) as u8
            })
            .collect();
        Self::packed(sequence, image.width, image.height, luma)
    }

    pub fn view(&self) -> Result<LumaFrame<'_>> {
        LumaFrame::new(
            self.width,
            self.height,
            self.row_stride,
            self.pixel_stride,
            &self.data,
        )
    }
}

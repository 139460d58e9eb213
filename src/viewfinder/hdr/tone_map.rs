use rayon::prelude::*;
use tracing::instrument;

use super::PARALLEL_THRESHOLD;
use crate::viewfinder::hdr::types::RgbaImageData;

const DEFAULT_CONTRAST: f32 = 6.0;

/// Global sigmoid tone curve, `255 * sigmoid(contrast * (v / 255 - 0.5))`.
///
/// The curve is evaluated once into a lookup table; applying it is a table
/// read per channel.
#[derive(Debug, Clone)]
pub struct ToneMapper {
    contrast: f32,
    lut: [u8; 256],
}

impl Default for ToneMapper {
    fn default() -> Self {
        Self::with_contrast(DEFAULT_CONTRAST)
    }
}

impl ToneMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contrast(contrast: f32) -> Self {
        let mut lut = [0u8; 256];
        for (value, entry) in lut.iter_mut().enumerate() {
            let x = contrast * (value as f32 / 255.0 - 0.5);
            let sigmoid = 1.0 / (1.0 + (-x).exp());
            *entry = (255.0 * sigmoid).round().clamp(0.0, 255.0) as u8;
        }
        Self { contrast, lut }
    }

    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    pub fn curve(&self, value: u8) -> u8 {
        self.lut[value as usize]
    }

    /// Maps R, G and B in place. Alpha is left as it is.
    #[instrument(skip_all, fields(width = image.width, height = image.height))]
    pub fn apply(&self, image: &mut RgbaImageData) {
        let lut = &self.lut;
        let map_pixel = |px: &mut [u8]| {
            px[0] = lut[px[0] as usize];
            px[1] = lut[px[1] as usize];
            px[2] = lut[px[2] as usize];
        };

        if image.pixel_count() >= PARALLEL_THRESHOLD {
            image.data.par_chunks_exact_mut(4).for_each(map_pixel);
        } else {
            image.data.chunks_exact_mut(4).for_each(map_pixel);
        }
    }
}

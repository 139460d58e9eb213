use std::io::Cursor;

use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use tracing::debug;

use crate::viewfinder::common::error::{Result, ViewfinderError};
use crate::viewfinder::hdr::RgbaImageData;

/// Display gamma applied after linearization.
const OUTPUT_GAMMA: f32 = 1.0 / 2.2;

/// Single-channel Bayer mosaic decoded from a RAW still
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: usize,
    pub height: usize,
    /// Sensor values, one per photosite
    pub data: Vec<u16>,
    pub black_level: u16,
    pub white_level: u16,
    /// White balance multipliers for R, G, B
    pub wb_coeffs: [f32; 3],
}

/// Linear demosaic (RGGB) on the CPU, producing display-ready 8-bit RGBA.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuDebayer;

impl CpuDebayer {
    pub fn process(&self, raw: &RawFrame) -> Result<RgbaImageData> {
        let width = raw.width;
        let height = raw.height;
        if width == 0 || height == 0 || raw.data.len() < width * height {
            return Err(ViewfinderError::InvalidDimensions(width as u32, height as u32));
        }
        debug!("Debayering {}x{} mosaic", width, height);

        let bayer_bytes: Vec<u8> = raw.data[..width * height]
            .iter()
            .flat_map(|&val| val.to_le_bytes())
            .collect();

        let mut output_buf = vec![0u8; width * height * 3 * 2];
        {
            let mut output_raster = RasterMut::new(width, height, RasterDepth::Depth16, &mut output_buf);
            bayer::run_demosaic(
                &mut Cursor::new(&bayer_bytes[..]),
                BayerDepth::Depth16LE,
                CFA::RGGB,
                Demosaic::Linear,
                &mut output_raster,
            )
            .map_err(|e| ViewfinderError::DecodeError(format!("demosaic failed: {:?}", e)))?;
        }

        let black = f32::from(raw.black_level);
        let range = (f32::from(raw.white_level) - black).max(1.0);
        let [wb_r, wb_g, wb_b] = raw.wb_coeffs;

        let to_display = |value: u16, gain: f32| -> u8 {
            let linear = ((f32::from(value) - black).max(0.0) / range * gain).clamp(0.0, 1.0);
            (linear.powf(OUTPUT_GAMMA) * 255.0).round() as u8
        };

        let data: Vec<u8> = output_buf
            .chunks_exact(6)
            .flat_map(|px| {
                let r = u16::from_le_bytes([px[0], px[1]]);
                let g = u16::from_le_bytes([px[2], px[3]]);
                let b = u16::from_le_bytes([px[4], px[5]]);
                [to_display(r, wb_r), to_display(g, wb_g), to_display(b, wb_b), u8::MAX]
            })
            .collect();

        Ok(RgbaImageData {
            width: width as u32,
            height: height as u32,
            data,
        })
    }
}

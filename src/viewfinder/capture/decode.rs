//! Decoding of staged stills into RGBA images.

use std::io::Cursor;

use rawloader::RawImageData as RawloaderImageData;
use tracing::debug;

use crate::viewfinder::capture::debayer::{CpuDebayer, RawFrame};
use crate::viewfinder::common::error::{Result, ViewfinderError};
use crate::viewfinder::hdr::DecodedImage;

/// How the capture function encodes the stills it stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StillEncoding {
    /// JPEG, PNG or TIFF
    #[default]
    Encoded,
    /// Camera RAW (DNG, ARW, ...)
    Raw,
}

pub trait StillDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage>;

    /// Extension given to staging files handed to the capture function.
    fn staging_suffix(&self) -> &'static str {
        ".jpg"
    }
}

impl<D: StillDecoder + ?Sized> StillDecoder for Box<D> {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage> {
        (**self).decode(data)
    }

    fn staging_suffix(&self) -> &'static str {
        (**self).staging_suffix()
    }
}

impl<D: StillDecoder + ?Sized> StillDecoder for &D {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage> {
        (**self).decode(data)
    }

    fn staging_suffix(&self) -> &'static str {
        (**self).staging_suffix()
    }
}

impl StillEncoding {
    pub fn decoder(self) -> Box<dyn StillDecoder + Send> {
        match self {
            StillEncoding::Encoded => Box::new(EncodedStillDecoder),
            StillEncoding::Raw => Box::new(RawStillDecoder::default()),
        }
    }
}

/// Decodes JPEG, PNG and TIFF stills, expanding them to RGBA8.
#[derive(Debug, Default, Clone, Copy)]
pub struct EncodedStillDecoder;

impl StillDecoder for EncodedStillDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage> {
        debug!("Decoding still, {} bytes", data.len());

        let decoded = image::load_from_memory(data)
            .map_err(|e| ViewfinderError::DecodeError(e.to_string()))?
            .to_rgba8();

        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(ViewfinderError::InvalidDimensions(width, height));
        }

        Ok(DecodedImage {
            width,
            height,
            data: decoded.into_raw(),
        })
    }
}

/// Decodes camera RAW stills with rawloader and demosaics them on the CPU.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStillDecoder {
    debayer: CpuDebayer,
}

impl StillDecoder for RawStillDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage> {
        debug!("Decoding RAW still, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| ViewfinderError::DecodeError(e.to_string()))?;

        if decoded.cpp != 1 {
            return Err(ViewfinderError::DecodeError(format!(
                "expected a single-channel mosaic, got {} components per pixel",
                decoded.cpp
            )));
        }

        // Float data is normalized to 0.0-1.0; scale it to the u16 range
        let mosaic: Vec<u16> = match decoded.data {
            RawloaderImageData::Integer(values) => values,
            RawloaderImageData::Float(values) => {
                values.iter().map(|&v| (v * u16::MAX as f32) as u16).collect()
            }
        };

        let white_level = decoded.whitelevels.iter().max().copied().unwrap_or(u16::MAX);
        let black_level = decoded.blacklevels.iter().min().copied().unwrap_or(0);

        let [r, g, b, _] = decoded.wb_coeffs;
        let wb_coeffs = if g.is_finite() && g > 0.0 && r.is_finite() && b.is_finite() {
            [r / g, 1.0, b / g]
        } else {
            [1.0, 1.0, 1.0]
        };

        debug!(
            width = decoded.width,
            height = decoded.height,
            black_level,
            white_level,
            "RAW still decoded"
        );

        self.debayer.process(&RawFrame {
            width: decoded.width,
            height: decoded.height,
            data: mosaic,
            black_level,
            white_level,
            wb_coeffs,
        })
    }

    fn staging_suffix(&self) -> &'static str {
        ".dng"
    }
}

use crate::viewfinder::common::error::{Result, ViewfinderError};

/// Packed RGBA8 image, row-major, four bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A still decoded from the capture function.
pub type DecodedImage = RgbaImageData;

/// Output of the merge engine.
pub type MergedImage = RgbaImageData;

impl RgbaImageData {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let image = Self { width, height, data };
        image.validate()?;
        Ok(image)
    }

    /// Image of one repeated pixel.
    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        let data = pixel.repeat(width as usize * height as usize);
        Self { width, height, data }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn same_dimensions(&self, other: &RgbaImageData) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Non-empty and backed by exactly `width * height * 4` bytes.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.data.len() != self.pixel_count() * 4 {
            return Err(ViewfinderError::InvalidDimensions(self.width, self.height));
        }
        Ok(())
    }
}

//! Capture sink module
//!
//! Final images leave the pipeline through a [`CaptureSink`]. The bundled
//! [`DirectorySink`] encodes them as JPEG or TIFF into a directory.

mod types;
mod directory_sink;


pub use types::{OutputFormat, OutputHint, StoredCapture, TiffCompression};
pub use directory_sink::DirectorySink;

use crate::viewfinder::common::error::Result;
use crate::viewfinder::hdr::RgbaImageData;

pub trait CaptureSink {
    fn store(&self, image: &RgbaImageData, hint: &OutputHint) -> Result<StoredCapture>;
}

impl<S: CaptureSink + ?Sized> CaptureSink for &S {
    fn store(&self, image: &RgbaImageData, hint: &OutputHint) -> Result<StoredCapture> {
        (**self).store(image, hint)
    }
}

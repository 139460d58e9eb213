//! HDR module
//!
//! Channel-wise merge of an exposure bracket and the sigmoid tone curve
//! applied to the merged result.

mod types;
mod merge;
mod tone_map;

#[cfg(test)]
mod tests;

pub use types::{DecodedImage, MergedImage, RgbaImageData};
pub use merge::merge;
pub use tone_map::ToneMapper;

/// Pixel count from which merge and tone mapping run on the rayon pool.
const PARALLEL_THRESHOLD: usize = 64 * 1024;

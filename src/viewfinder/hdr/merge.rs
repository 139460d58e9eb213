use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use super::PARALLEL_THRESHOLD;
use crate::viewfinder::common::error::{Result, ViewfinderError};
use crate::viewfinder::hdr::types::{DecodedImage, MergedImage};

/// Averages aligned exposures channel by channel.
///
/// The first image fixes the output dimensions; any later image with other
/// dimensions is left out and the mean is taken over the images that remain.
/// Colour channels are rounded to nearest, alpha is always opaque.
///
/// An empty slice is a caller error and returns [`ViewfinderError::EmptyMerge`].
#[instrument(skip_all, fields(images = images.len()))]
pub fn merge(images: &[DecodedImage]) -> Result<MergedImage> {
    let first = images.first().ok_or(ViewfinderError::EmptyMerge)?;
    first.validate()?;

    let contributing: Vec<&[u8]> = images
        .iter()
        .enumerate()
        .filter_map(|(index, image)| {
            if image.same_dimensions(first) && image.data.len() == first.data.len() {
                Some(image.data.as_slice())
            } else {
                warn!(
                    index,
                    width = image.width,
                    height = image.height,
                    expected_width = first.width,
                    expected_height = first.height,
                    "Skipping image with mismatched dimensions"
                );
                None
            }
        })
        .collect();

    let count = contributing.len() as u32;
    debug!(contributing = count, "Merging exposures");

    let mean_pixel = |pixel: usize, out: &mut [u8]| {
        let offset = pixel * 4;
        for channel in 0..3 {
            let sum: u32 = contributing
                .iter()
                .map(|data| u32::from(data[offset + channel]))
                .sum();
            out[channel] = ((2 * sum + count) / (2 * count)).min(255) as u8;
        }
        out[3] = u8::MAX;
    };

    let mut data = vec![0u8; first.data.len()];
    if first.pixel_count() >= PARALLEL_THRESHOLD {
        data.par_chunks_exact_mut(4)
            .enumerate()
            .for_each(|(pixel, out)| mean_pixel(pixel, out));
    } else {
        data.chunks_exact_mut(4)
            .enumerate()
            .for_each(|(pixel, out)| mean_pixel(pixel, out));
    }

    Ok(MergedImage {
        width: first.width,
        height: first.height,
        data,
    })
}

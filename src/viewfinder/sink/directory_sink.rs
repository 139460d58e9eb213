use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use tracing::{debug, info, warn};

use crate::viewfinder::common::error::{Result, ViewfinderError};
use crate::viewfinder::hdr::RgbaImageData;
use crate::viewfinder::sink::CaptureSink;
use crate::viewfinder::sink::types::{OutputFormat, OutputHint, StoredCapture, TiffCompression};

const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Writes captures as files into one directory.
///
/// Names come from the hint. When a file of that name already exists a
/// numeric suffix is appended rather than overwriting it. The name is
/// claimed with an exclusive create, so concurrent stores never share a file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the first free file among `file_name`, `stem_1.ext`,
    /// `stem_2.ext` and so on.
    fn create_unique(&self, file_name: &str) -> Result<(PathBuf, File)> {
        let (stem, extension) = match file_name.rsplit_once('.') {
            Some((stem, extension)) => (stem, format!(".{extension}")),
            None => (file_name, String::new()),
        };

        for n in 0..MAX_NAME_ATTEMPTS {
            let path = if n == 0 {
                self.dir.join(file_name)
            } else {
                self.dir.join(format!("{stem}_{n}{extension}"))
            };
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Output name taken");
                }
                Err(e) => {
                    return Err(ViewfinderError::OutputWriteError(format!("{}: {}", path.display(), e)));
                }
            }
        }
        Err(ViewfinderError::OutputWriteError(format!(
            "no free name for {} in {}",
            file_name,
            self.dir.display()
        )))
    }
}

impl CaptureSink for DirectorySink {
    fn store(&self, image: &RgbaImageData, hint: &OutputHint) -> Result<StoredCapture> {
        image.validate()?;

        let rgb = strip_alpha(image);
        let mut encoded = Vec::new();
        match hint.format {
            OutputFormat::Jpeg { quality } => {
                encode_jpeg(&rgb, image.width, image.height, quality, &mut encoded)?
            }
            OutputFormat::Tiff {
                compression,
                predictor,
            } => encode_tiff(&rgb, image.width, image.height, compression, predictor, &mut encoded)?,
        }

        let (path, file) = self.create_unique(&hint.file_name)?;
        info!(path = %path.display(), mime_type = %hint.mime_type, "Storing capture");

        let mut writer = BufWriter::new(file);
        if let Err(e) = writer.write_all(&encoded).and_then(|_| writer.flush()) {
            drop(writer);
            if let Err(remove_err) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %remove_err, "Failed to remove partial capture");
            }
            return Err(ViewfinderError::OutputWriteError(format!("{}: {}", path.display(), e)));
        }

        debug!(bytes = encoded.len(), "Capture written");
        Ok(StoredCapture {
            path,
            mime_type: hint.mime_type.clone(),
            width: image.width,
            height: image.height,
        })
    }
}

fn strip_alpha(image: &RgbaImageData) -> Vec<u8> {
    image
        .data
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}

fn encode_jpeg(rgb: &[u8], width: u32, height: u32, quality: u8, out: &mut Vec<u8>) -> Result<()> {
    debug!("Encoding JPEG image: {}x{} at quality {}", width, height, quality);

    let mut encoder = JpegEncoder::new_with_quality(out, quality.clamp(1, 100));
    encoder
        .encode(rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| ViewfinderError::EncodeError(e.to_string()))
}

fn encode_tiff(
    rgb: &[u8],
    width: u32,
    height: u32,
    compression: TiffCompression,
    predictor: Option<u16>,
    out: &mut Vec<u8>,
) -> Result<()> {
    use tiff::encoder::compression::DeflateLevel;

    debug!("Encoding TIFF image: {}x{}", width, height);

    let compression = match compression {
        TiffCompression::None => tiff::encoder::Compression::Uncompressed,
        TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
        TiffCompression::DeflateFast => tiff::encoder::Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => tiff::encoder::Compression::Deflate(DeflateLevel::Best),
    };

    let mut encoder = tiff::encoder::TiffEncoder::new(std::io::Cursor::new(out))
        .map_err(|e| ViewfinderError::EncodeError(e.to_string()))?
        .with_compression(compression);

    if let Some(predictor_val) = predictor {
        let predictor = match predictor_val {
            2 => tiff::tags::Predictor::Horizontal,
            _ => tiff::tags::Predictor::None,
        };
        encoder = encoder.with_predictor(predictor);
    }

    encoder
        .write_image::<tiff::encoder::colortype::RGB8>(width, height, rgb)
        .map_err(|e| ViewfinderError::EncodeError(e.to_string()))
}

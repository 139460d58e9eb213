use std::path::PathBuf;

use chrono::{DateTime, TimeZone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    None,
    #[default]
    Lzw,
    DeflateFast,
    DeflateBalanced,
    DeflateBest,
}

/// Encoding of a stored capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg {
        quality: u8,
    },
    Tiff {
        compression: TiffCompression,
        /// TIFF predictor tag value; 2 is horizontal differencing
        predictor: Option<u16>,
    },
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Jpeg { quality: 95 }
    }
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "jpg",
            OutputFormat::Tiff { .. } => "tiff",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "image/jpeg",
            OutputFormat::Tiff { .. } => "image/tiff",
        }
    }
}

/// Where and how the sink should store one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputHint {
    pub file_name: String,
    pub mime_type: String,
    pub format: OutputFormat,
}

impl OutputHint {
    pub fn new(file_name: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: format.mime_type().to_string(),
            format,
        }
    }

    /// `PREFIX_yyyyMMdd_HHmmss.ext`
    pub fn timestamped<Tz>(prefix: &str, format: OutputFormat, at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let timestamp = at.format("%Y%m%d_%H%M%S");
        Self::new(format!("{}_{}.{}", prefix, timestamp, format.extension()), format)
    }
}

/// A capture written by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCapture {
    pub path: PathBuf,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

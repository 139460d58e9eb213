//! Per-frame luma analysis
//!
//! Histogram, zebra (overexposure) and focus-peaking maps computed over a
//! borrowed `LumaFrame`. Every call recomputes its output from scratch.

mod grid;
mod histogram;
mod zebra_peaking;
mod frame_analyzer;
pub mod types;


pub use grid::AnalysisGrid;
pub use histogram::{Histogram, HistogramAnalyzer};
pub use zebra_peaking::ZebraPeakingAnalyzer;
pub use frame_analyzer::{FrameAnalysis, FrameAnalyzer};
pub use types::{AnalysisConfig, AnalysisConfigBuilder};

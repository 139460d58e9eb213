use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use image::{ImageFormat, Rgba, RgbaImage};
use viewfinder_rs::logger;
use viewfinder_rs::viewfinder::{
    self, AnalysisConfig, AnalysisWorker, CancellationToken, CaptureConfig, CaptureMode,
    CapturePipeline, DirectorySink, ExposureControl, ExposureRange, LumaBuffer, RgbaImageData,
    SoftwareActuator, StillCapture, ViewfinderError,
};

use tracing::{error, info};

const PREVIEW_WIDTH: u32 = 640;
const PREVIEW_HEIGHT: u32 = 360;
const PREVIEW_FRAMES: u64 = 30;

#[derive(Parser, Debug)]
#[command(name = "viewfinder_rs")]
#[command(about = "Analyzes a synthetic preview stream, then takes one capture")]
#[command(version)]
struct Cli {
    /// Capture mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Hdr)]
    mode: ModeArg,

    /// Directory the capture is written to
    #[arg(short, long, default_value = "captures")]
    output: PathBuf,

    /// Still files replayed as the camera output (a synthetic scene if none)
    stills: Vec<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    Auto,
    Hdr,
    Night,
    SuperResolution,
    Portrait,
}

impl From<ModeArg> for CaptureMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => CaptureMode::Auto,
            ModeArg::Hdr => CaptureMode::Hdr,
            ModeArg::Night => CaptureMode::Night,
            ModeArg::SuperResolution => CaptureMode::SuperResolution,
            ModeArg::Portrait => CaptureMode::Portrait,
        }
    }
}

/// Hands out the given still files in turn, ignoring the exposure index.
struct ReplayCamera {
    stills: Vec<PathBuf>,
    next: usize,
}

impl StillCapture for ReplayCamera {
    fn capture_still(&mut self, _exposure_index: i32, staging: &Path) -> viewfinder::Result<()> {
        let source = &self.stills[self.next % self.stills.len()];
        self.next += 1;
        std::fs::copy(source, staging)
            .map_err(|e| ViewfinderError::CaptureFailed(format!("{}: {}", source.display(), e)))?;
        Ok(())
    }
}

/// Renders a synthetic scene whose brightness follows the exposure index.
struct SyntheticCamera;

impl StillCapture for SyntheticCamera {
    fn capture_still(&mut self, exposure_index: i32, staging: &Path) -> viewfinder::Result<()> {
        let gain = 2f32.powi(exposure_index);
        let still = RgbaImage::from_fn(PREVIEW_WIDTH, PREVIEW_HEIGHT, |x, y| {
            let [r, g, b, a] = scene_pixel(x, y);
            let expose = |v: u8| (f32::from(v) * gain).min(255.0) as u8;
            Rgba([expose(r), expose(g), expose(b), a])
        });
        still
            .save_with_format(staging, ImageFormat::Png)
            .map_err(|e| ViewfinderError::CaptureFailed(e.to_string()))
    }
}

fn scene_pixel(x: u32, y: u32) -> [u8; 4] {
    let r = (x * 255 / PREVIEW_WIDTH) as u8;
    let g = (y * 255 / PREVIEW_HEIGHT) as u8;
    let b = if (x / 40 + y / 40) % 2 == 0 { 230 } else { 30 };
    [r, g, b, 255]
}

fn preview_frame(sequence: u64) -> LumaBuffer {
    let data = (0..PREVIEW_WIDTH * PREVIEW_HEIGHT)
        .flat_map(|i| scene_pixel((i % PREVIEW_WIDTH + sequence as u32 * 8) % PREVIEW_WIDTH, i / PREVIEW_WIDTH))
        .collect();
    let image = RgbaImageData {
        width: PREVIEW_WIDTH,
        height: PREVIEW_HEIGHT,
        data,
    };
    LumaBuffer::from_rgba(sequence, &image)
}

fn run_preview() -> Result<()> {
    let config = AnalysisConfig::default();
    let mut worker = AnalysisWorker::spawn(config, |analysis| {
        let zebra = analysis.zebra.cells().iter().filter(|&&z| z).count();
        let peaking = analysis.peaking_highlights.cells().iter().filter(|&&p| p).count();
        info!(
            sequence = analysis.sequence,
            samples = analysis.histogram.total(),
            clipped = analysis.histogram.clipped_highlights(250),
            zebra_cells = zebra,
            peaking_cells = peaking,
            "Frame analyzed"
        );
    })
    .context("Failed to start analysis worker")?;

    for sequence in 0..PREVIEW_FRAMES {
        worker.submit(preview_frame(sequence));
        std::thread::sleep(Duration::from_millis(5));
    }
    std::thread::sleep(Duration::from_millis(100));
    worker.stop();

    info!(
        processed = worker.processed_frames(),
        dropped = worker.dropped_frames(),
        "Preview analysis finished"
    );
    Ok(())
}

fn run_capture<C: StillCapture>(camera: C, mode: CaptureMode, output_dir: &Path) -> Result<()> {
    let sink = DirectorySink::new(output_dir)
        .with_context(|| format!("Cannot use output directory {}", output_dir.display()))?;
    let exposure = ExposureControl::new(SoftwareActuator::new(Some(ExposureRange::new(-4, 4))));
    let mut pipeline = CapturePipeline::new(camera, sink, CaptureConfig::default());

    match pipeline.capture(mode, &exposure, &CancellationToken::new()) {
        Ok(outcome) => {
            info!(
                path = %outcome.stored.path.display(),
                merged = outcome.shots_merged,
                failed = outcome.failures.len(),
                "Capture saved"
            );
            if let Some(reason) = outcome.restore_error {
                error!("Exposure left off neutral: {}", reason);
            }
            Ok(())
        }
        Err(e) => {
            error!("Capture failed: {}", e);
            Err(e.into())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init();

    info!("Starting viewfinder_rs...");

    let mode = CaptureMode::from(cli.mode);
    run_preview()?;

    if cli.stills.is_empty() {
        info!("No stills given, capturing a synthetic scene");
        run_capture(SyntheticCamera, mode, &cli.output)
    } else {
        info!("Replaying {} still(s)", cli.stills.len());
        run_capture(ReplayCamera { stills: cli.stills, next: 0 }, mode, &cli.output)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["viewfinder_rs"]).unwrap();
        assert_eq!(CaptureMode::from(cli.mode), CaptureMode::Hdr);
        assert_eq!(cli.output, PathBuf::from("captures"));
        assert!(cli.stills.is_empty());
    }

    #[test]
    fn test_cli_mode_output_and_stills() {
        let cli = Cli::try_parse_from([
            "viewfinder_rs",
            "--mode",
            "super-resolution",
            "-o",
            "out",
            "a.jpg",
            "b.jpg",
        ])
        .unwrap();
        assert_eq!(CaptureMode::from(cli.mode), CaptureMode::SuperResolution);
        assert_eq!(cli.output, PathBuf::from("out"));
        assert_eq!(cli.stills, vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]);
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["viewfinder_rs", "--mode", "panorama"]).is_err());
    }

    #[test]
    fn test_help_is_not_an_error_exit() {
        let err = Cli::try_parse_from(["viewfinder_rs", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_mode_names_match_capture_modes() {
        for mode in ModeArg::value_variants() {
            let name = mode.to_possible_value().unwrap().get_name().to_string();
            assert_eq!(name, CaptureMode::from(*mode).to_string());
        }
    }
}

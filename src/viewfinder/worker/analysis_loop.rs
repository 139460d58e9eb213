use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::viewfinder::analysis::{AnalysisConfig, FrameAnalysis, FrameAnalyzer};
use crate::viewfinder::common::error::Result;
use crate::viewfinder::frame::LumaBuffer;
use crate::viewfinder::worker::latest_slot::LatestFrameSlot;

/// How long the worker waits for a frame before re-checking the stop signal.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Dedicated analysis thread fed through a `LatestFrameSlot`.
///
/// Each frame is analyzed to completion before the next one is taken. The
/// consumer callback receives the analysis by reference; its buffers are
/// reused for the next frame.
///
/// ```no_run
/// use viewfinder_rs::viewfinder::{AnalysisConfig, AnalysisWorker, LumaBuffer};
///
/// let mut worker = AnalysisWorker::spawn(AnalysisConfig::default(), |analysis| {
///     println!("frame {}: {} samples", analysis.sequence, analysis.histogram.total());
/// }).unwrap();
/// worker.submit(LumaBuffer::packed(0, 640, 480, vec![128; 640 * 480]));
/// worker.stop();
/// ```
pub struct AnalysisWorker {
    slot: Arc<LatestFrameSlot<LumaBuffer>>,
    stop_signal: Arc<AtomicBool>,
    processed: Arc<AtomicU64>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    pub fn spawn<F>(config: AnalysisConfig, mut on_analysis: F) -> Result<Self>
    where
        F: FnMut(&FrameAnalysis) + Send + 'static,
    {
        let slot = Arc::new(LatestFrameSlot::new());
        let stop_signal = Arc::new(AtomicBool::new(false));
        let processed = Arc::new(AtomicU64::new(0));

        let thread_slot = Arc::clone(&slot);
        let thread_stop = Arc::clone(&stop_signal);
        let thread_processed = Arc::clone(&processed);

        info!(
            grid_width = config.grid_width,
            grid_height = config.grid_height,
            "Starting analysis worker"
        );

        let thread_handle = thread::Builder::new()
            .name("viewfinder-analysis".to_string())
            .spawn(move || {
                let analyzer = FrameAnalyzer::new(config);
                let mut analysis = analyzer.new_analysis();

                loop {
                    if thread_stop.load(Ordering::SeqCst) {
                        debug!("Stop signal received");
                        break;
                    }

                    let Some(frame) = thread_slot.take(POLL_INTERVAL) else {
                        if thread_slot.is_closed() {
                            break;
                        }
                        continue;
                    };

                    analyzer.analyze_buffer(&frame, &mut analysis);
                    on_analysis(&analysis);
                    thread_processed.fetch_add(1, Ordering::Relaxed);
                    trace!(sequence = frame.sequence, "Frame analyzed");
                }

                info!("Analysis worker exiting");
            })?;

        Ok(Self {
            slot,
            stop_signal,
            processed,
            thread_handle: Some(thread_handle),
        })
    }

    /// Hands a frame to the worker. Returns `true` if it superseded a frame
    /// the worker had not started on yet.
    pub fn submit(&self, frame: LumaBuffer) -> bool {
        match self.slot.publish(frame) {
            Some(dropped) => {
                trace!(sequence = dropped.sequence, "Dropped superseded frame");
                true
            }
            None => false,
        }
    }

    pub fn dropped_frames(&self) -> u64 {
        self.slot.dropped()
    }

    pub fn processed_frames(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signals the thread, wakes it and waits for the frame in progress to finish.
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.slot.close();

        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!("Analysis worker thread panicked: {:?}", e);
            } else {
                debug!(
                    processed = self.processed_frames(),
                    dropped = self.dropped_frames(),
                    "Analysis worker stopped"
                );
            }
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.stop();
        }
    }
}

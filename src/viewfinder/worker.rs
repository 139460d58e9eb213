//! Frame analysis worker
//!
//! Frames from the source go through a single-slot exchange: a newer frame
//! replaces a pending one instead of queueing behind it. A dedicated thread
//! drains the slot and analyzes each frame to completion.

mod latest_slot;
mod analysis_loop;

pub use latest_slot::LatestFrameSlot;
pub use analysis_loop::AnalysisWorker;

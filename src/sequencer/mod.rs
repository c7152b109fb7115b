//! # Frame Sequencer
//!
//! Drives a conversion run: scan the input folder, fix the frame size, write
//! every image as one frame, then finalize the output.

pub mod engine;

// Re-exports for convenience
pub use engine::{resolve_frame_size, FrameSequencer, Progress, RunState, RunSummary, SkippedFrame};

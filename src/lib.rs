//! # Frame Sequencer
//!
//! Turn a folder of still images into a single video file, one image per frame.
//!
//! Images are listed from the input folder, put in natural filename order
//! (`img2.jpg` before `img10.jpg`), decoded, rescaled to a common frame size
//! and appended to an MPEG-4 file at a fixed frame rate. Images that fail to
//! decode are skipped with a warning; folder and encoder failures abort the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use frame_sequencer::{config::Config, FrameSequencer};
//!
//! # fn main() -> frame_sequencer::Result<()> {
//! let mut config = Config::default();
//! config.input.directory = "shots/".into();
//! config.output.directory = "renders/".into();
//! config.video.fps = 4.0;
//!
//! let summary = FrameSequencer::new(config)?.convert()?;
//! println!("{} frames, {} skipped", summary.frames_written, summary.frames_skipped);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`scan`] - Directory listing, extension filter and natural sort key
//! - [`video`] - Frames, image decoding and encoder backends
//! - [`sequencer`] - The run itself and its state machine
//! - [`config`] - Configuration management

pub mod config;
pub mod error;
pub mod scan;
pub mod sequencer;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, SequencerError},
    scan::ImageFileEntry,
    sequencer::{FrameSequencer, RunSummary},
    video::{FrameSize, VideoWriter},
};

//! # Video Module
//!
//! Image decoding, frame buffers and the encoder backends frames are written through.

pub mod decoder;
pub mod process_writer;
pub mod types;
pub mod writer;

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_writer;

pub use decoder::ImageDecoder;
pub use process_writer::ProcessWriter;
pub use types::{Frame, FrameSize, PixelOrder, ResizeFilter, StreamSpec};
pub use writer::{create_writer, EncoderBackend, VideoWriter, WriterSession};

#[cfg(feature = "ffmpeg")]
pub use ffmpeg_writer::FfmpegWriter;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::video::process_writer::ProcessWriter;
use crate::video::types::{Frame, PixelOrder, StreamSpec};

/// Abstracts video encoding so the sequencer can write output without
/// depending on a specific codec library.
pub trait VideoWriter {
    /// Channel order `write` expects its frames in
    fn pixel_order(&self) -> PixelOrder;

    /// Fails with [`VideoError::WriterInitFailed`] when the encoder or
    /// container cannot be set up for `spec`.
    fn open(&mut self, path: &Path, spec: &StreamSpec) -> Result<()>;

    fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Flush pending packets and finalize the container.
    fn close(&mut self) -> Result<()>;
}

/// Which encoder implementation backs a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderBackend {
    /// Pipe raw frames into an external `ffmpeg` process
    Process,
    /// Encode in-process through libav (requires the `ffmpeg` feature)
    Library,
}

impl Default for EncoderBackend {
    fn default() -> Self {
        Self::Process
    }
}

/// Build an unopened writer for the configured backend
pub fn create_writer(backend: EncoderBackend) -> Result<Box<dyn VideoWriter>> {
    match backend {
        EncoderBackend::Process => Ok(Box::new(ProcessWriter::new())),
        #[cfg(feature = "ffmpeg")]
        EncoderBackend::Library => Ok(Box::new(crate::video::ffmpeg_writer::FfmpegWriter::new())),
        #[cfg(not(feature = "ffmpeg"))]
        EncoderBackend::Library => Err(crate::error::VideoError::WriterInitFailed {
            reason: "the library backend needs the 'ffmpeg' feature; rebuild with --features ffmpeg or use backend = \"process\"".to_string(),
        }
        .into()),
    }
}

/// An opened writer that is closed exactly once.
///
/// Call [`finish`](Self::finish) to close and observe errors; dropping an
/// unfinished session (early return, `?`, unwind) closes it anyway.
pub struct WriterSession<'w> {
    writer: &'w mut dyn VideoWriter,
    frames_written: usize,
    closed: bool,
}

impl<'w> WriterSession<'w> {
    pub fn open(writer: &'w mut dyn VideoWriter, path: &Path, spec: &StreamSpec) -> Result<Self> {
        writer.open(path, spec)?;
        debug!("Opened writer for {:?} ({} @ {} fps, {})", path, spec.frame_size, spec.fps, spec.codec);
        Ok(Self {
            writer,
            frames_written: 0,
            closed: false,
        })
    }

    pub fn pixel_order(&self) -> PixelOrder {
        self.writer.pixel_order()
    }

    pub fn write(&mut self, frame: &Frame) -> Result<()> {
        self.writer.write(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Close the writer, returning how many frames went in
    pub fn finish(mut self) -> Result<usize> {
        self.closed = true;
        self.writer.close()?;
        Ok(self.frames_written)
    }
}

impl Drop for WriterSession<'_> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.writer.close() {
                warn!("Failed to release video writer: {}", e);
            }
        }
    }
}

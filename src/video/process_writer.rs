use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::error::{Result, VideoError};
use crate::video::types::{Frame, FrameSize, PixelOrder, StreamSpec};
use crate::video::writer::VideoWriter;

/// Encodes frames by streaming raw BGR24 pixels into an external `ffmpeg`
/// process over stdin.
pub struct ProcessWriter {
    program: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    frame_size: Option<FrameSize>,
    frames_written: usize,
}

impl ProcessWriter {
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    /// Use a specific ffmpeg executable instead of the one on `PATH`
    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            child: None,
            stdin: None,
            stderr: None,
            frame_size: None,
            frames_written: 0,
        }
    }

    pub fn check_ffmpeg_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn build_command(&self, path: &Path, spec: &StreamSpec) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "-hide_banner",
            "-nostats",
            "-loglevel", "error",
            "-y",
            "-f", "rawvideo",
            "-pixel_format", "bgr24",
            "-video_size", &format!("{}x{}", spec.frame_size.width, spec.frame_size.height),
            "-framerate", &spec.fps.to_string(),
            "-i", "pipe:0",
            "-an",
            "-c:v", &spec.codec,
            "-q:v", &quality_to_qscale(spec.quality).to_string(),
            "-pix_fmt", "yuv420p",
        ]);
        cmd.arg(path);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }

    /// Wait for ffmpeg to exit and return its stderr when it failed
    fn reap(&mut self) -> Option<String> {
        // Closing stdin signals end of stream
        self.stdin = None;
        let mut child = self.child.take()?;

        let status = child.wait();
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        match status {
            Ok(status) if status.success() => None,
            Ok(status) => Some(format!("ffmpeg exited with {}: {}", status, stderr.trim())),
            Err(e) => Some(format!("failed to wait for ffmpeg: {}", e)),
        }
    }

    /// Reason ffmpeg stopped, if it already exited while frames are still coming
    fn exited_early(&mut self) -> Option<String> {
        let exited = matches!(self.child.as_mut().map(|child| child.try_wait()), Some(Ok(Some(_))));
        if !exited {
            return None;
        }
        Some(
            self.reap()
                .unwrap_or_else(|| "ffmpeg exited before the end of the stream".to_string()),
        )
    }

    fn fail(&self, reason: String) -> VideoError {
        // Until a frame has been taken, a dead ffmpeg means it refused the stream setup
        if self.frames_written == 0 {
            VideoError::WriterInitFailed { reason }
        } else {
            VideoError::EncodingFailed { reason }
        }
    }
}

impl Default for ProcessWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for ProcessWriter {
    fn pixel_order(&self) -> PixelOrder {
        PixelOrder::Bgr
    }

    fn open(&mut self, path: &Path, spec: &StreamSpec) -> Result<()> {
        if self.child.is_some() {
            return Err(VideoError::WriterInitFailed {
                reason: "writer is already open".to_string(),
            }
            .into());
        }

        if !self.check_ffmpeg_available() {
            return Err(VideoError::WriterInitFailed {
                reason: format!("'{}' not found. Please install FFmpeg.", self.program),
            }
            .into());
        }

        let mut child = self
            .build_command(path, spec)
            .spawn()
            .map_err(|e| VideoError::WriterInitFailed {
                reason: format!("failed to spawn {}: {}", self.program, e),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| VideoError::WriterInitFailed {
            reason: "ffmpeg stdin is not available".to_string(),
        })?;

        // Drained on a thread so a chatty ffmpeg never blocks on a full pipe
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        info!("Encoding {} @ {} fps with {} via {}", spec.frame_size, spec.fps, spec.codec, self.program);

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr = stderr;
        self.frame_size = Some(spec.frame_size);
        self.frames_written = 0;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        let expected = self.frame_size.ok_or_else(|| VideoError::EncodingFailed {
            reason: "ProcessWriter: not opened".to_string(),
        })?;

        if frame.size() != expected {
            return Err(VideoError::EncodingFailed {
                reason: format!("frame is {} but the stream is {}", frame.size(), expected),
            }
            .into());
        }

        let frame = if frame.order() == PixelOrder::Bgr {
            std::borrow::Cow::Borrowed(frame)
        } else {
            std::borrow::Cow::Owned(frame.clone().into_order(PixelOrder::Bgr))
        };

        if let Some(reason) = self.exited_early() {
            return Err(self.fail(reason).into());
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| VideoError::EncodingFailed {
            reason: "ffmpeg stdin already closed".to_string(),
        })?;

        if let Err(e) = stdin.write_all(frame.data()) {
            let reason = self.reap().unwrap_or_else(|| e.to_string());
            return Err(self.fail(reason).into());
        }

        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.child.is_none() {
            return Ok(());
        }

        if let Some(stdin) = self.stdin.as_mut() {
            if let Err(e) = stdin.flush() {
                warn!("Failed to flush frames to ffmpeg: {}", e);
            }
        }

        self.frame_size = None;
        match self.reap() {
            None => {
                debug!("ffmpeg finished after {} frames", self.frames_written);
                Ok(())
            }
            Some(reason) => Err(VideoError::EncodingFailed { reason }.into()),
        }
    }
}

impl Drop for ProcessWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to finish ffmpeg on drop: {}", e);
        }
    }
}

/// Map 0-100 quality onto mpeg4's qscale, where 1 is best and 31 worst
pub(crate) fn quality_to_qscale(quality: u8) -> u8 {
    let quality = quality.min(100) as u32;
    (31 - quality * 30 / 100) as u8
}

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{Result, SequencerError, VideoError},
    scan::{scan_directory, ImageFileEntry},
    video::{create_writer, FrameSize, ImageDecoder, VideoWriter, WriterSession},
};

/// Where a run currently is.
///
/// `Idle → Scanning → SizeResolved → Writing → Finalized`, with `Aborted`
/// reachable from every step but the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Scanning,
    SizeResolved,
    Writing,
    Finalized,
    Aborted,
}

/// Emitted once per processed image, whether it was written or skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress<'a> {
    /// 1-based position in the sorted sequence
    pub index: usize,
    pub total: usize,
    pub file_name: &'a str,
}

/// An image that could not be decoded and was left out of the video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFrame {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub frame_size: FrameSize,
    pub fps: f64,
    /// Images that passed the scan
    pub total_entries: usize,
    pub frames_written: usize,
    pub frames_skipped: usize,
    pub skipped: Vec<SkippedFrame>,
}

/// Turns a folder of still images into a video, one image per frame.
///
/// The sequencer follows a linear pipeline:
/// 1. Scan - list the input folder and sort images naturally
/// 2. Size - fix the frame size from configuration or the first image
/// 3. Write - decode, rescale and append each image through a [`VideoWriter`]
/// 4. Finalize - close the writer and report counts
pub struct FrameSequencer {
    config: Config,
    decoder: ImageDecoder,
    state: RunState,
}

impl FrameSequencer {
    /// Create a sequencer for a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let decoder = ImageDecoder::new(config.video.resize_filter);
        Ok(Self {
            config,
            decoder,
            state: RunState::Idle,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn abort<T, E: Into<SequencerError>>(&mut self, err: E) -> Result<T> {
        self.transition(RunState::Aborted);
        Err(err.into())
    }

    /// Full pipeline using the encoder backend named in the configuration
    pub fn convert(&mut self) -> Result<RunSummary> {
        let (entries, frame_size) = self.prepare()?;

        let mut writer = match create_writer(self.config.video.backend) {
            Ok(writer) => writer,
            Err(e) => return self.abort(e),
        };

        self.run(&entries, frame_size, writer.as_mut())
    }

    /// Full pipeline writing through a caller-supplied writer
    pub fn convert_with(&mut self, writer: &mut dyn VideoWriter) -> Result<RunSummary> {
        let (entries, frame_size) = self.prepare()?;
        self.run(&entries, frame_size, writer)
    }

    fn prepare(&mut self) -> Result<(Vec<ImageFileEntry>, FrameSize)> {
        info!("🎬 Converting {:?} -> {:?}", self.config.input.directory, self.config.output_path());

        info!("📂 Step 1: Scanning input folder...");
        let entries = self.scan()?;

        info!("📐 Step 2: Resolving frame size...");
        let frame_size = self.resolve_frame_size(&entries)?;

        Ok((entries, frame_size))
    }

    // ==========================================
    // STEP 1: SCAN
    // ==========================================

    /// List accepted images in the input folder in natural order
    pub fn scan(&mut self) -> Result<Vec<ImageFileEntry>> {
        self.transition(RunState::Scanning);

        let filter = self.config.input.extension_filter();
        match scan_directory(&self.config.input.directory, &filter) {
            Ok(entries) => {
                for entry in &entries {
                    debug!("   {}", entry.file_name());
                }
                Ok(entries)
            }
            Err(e) => self.abort(e),
        }
    }

    // ==========================================
    // STEP 2: FRAME SIZE
    // ==========================================

    /// The configured size, or else the natural size of the first image
    pub fn resolve_frame_size(&mut self, entries: &[ImageFileEntry]) -> Result<FrameSize> {
        match resolve_frame_size(entries, self.config.video.frame_size) {
            Ok(size) => {
                info!("   Frame size: {}", size);
                self.transition(RunState::SizeResolved);
                Ok(size)
            }
            Err(e) => self.abort(e),
        }
    }

    // ==========================================
    // STEP 3 + 4: WRITE AND FINALIZE
    // ==========================================

    /// Write every entry as one frame and finalize the output
    pub fn run(
        &mut self,
        entries: &[ImageFileEntry],
        frame_size: FrameSize,
        writer: &mut dyn VideoWriter,
    ) -> Result<RunSummary> {
        self.run_with_progress(entries, frame_size, writer, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_progress` after each image
    pub fn run_with_progress<F>(
        &mut self,
        entries: &[ImageFileEntry],
        frame_size: FrameSize,
        writer: &mut dyn VideoWriter,
        mut on_progress: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(&Progress<'_>),
    {
        info!("🎞️  Step 3: Writing {} frames...", entries.len());

        let output_path = self.config.output_path();
        let spec = self.config.video.stream_spec(frame_size);

        if let Err(e) = std::fs::create_dir_all(&self.config.output.directory) {
            return self.abort(e);
        }

        let mut session = match WriterSession::open(writer, &output_path, &spec) {
            Ok(session) => session,
            Err(e) => return self.abort(e),
        };
        self.transition(RunState::Writing);

        let order = session.pixel_order();
        let total = entries.len();
        let mut skipped = Vec::new();

        for (i, entry) in entries.iter().enumerate() {
            let index = i + 1;

            match self.decoder.decode(entry.path(), frame_size) {
                Ok(frame) => {
                    if let Err(e) = session.write(&frame.into_order(order)) {
                        // Dropping the session releases the writer
                        drop(session);
                        return self.abort(e);
                    }
                }
                Err(e) => {
                    warn!("Skipping unreadable image [{}]: {}", entry.file_name(), e);
                    skipped.push(SkippedFrame {
                        path: entry.path().to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }

            info!(
                "Progress: {}/{} ({:.1}%) - {}",
                index,
                total,
                index as f64 * 100.0 / total as f64,
                entry.file_name()
            );
            on_progress(&Progress {
                index,
                total,
                file_name: entry.file_name(),
            });
        }

        info!("📦 Step 4: Finalizing {:?}...", output_path);
        let frames_written = match session.finish() {
            Ok(frames) => frames,
            Err(e) => return self.abort(e),
        };
        self.transition(RunState::Finalized);

        let summary = RunSummary {
            output_path,
            frame_size,
            fps: spec.fps,
            total_entries: total,
            frames_written,
            frames_skipped: skipped.len(),
            skipped,
        };

        info!("✅ Video written: {:?}", summary.output_path);
        info!("   Frames written: {}", summary.frames_written);
        info!("   Frames skipped: {}", summary.frames_skipped);
        Ok(summary)
    }
}

/// Frame size for a run: `configured` when given, otherwise the first entry's dimensions
pub fn resolve_frame_size(
    entries: &[ImageFileEntry],
    configured: Option<FrameSize>,
) -> std::result::Result<FrameSize, VideoError> {
    if let Some(size) = configured {
        return Ok(size);
    }

    let first = entries.first().ok_or_else(|| VideoError::UnreadableFirstFrame {
        path: String::new(),
        reason: "no images to read".to_string(),
    })?;

    ImageDecoder::probe_size(first.path()).map_err(|e| VideoError::UnreadableFirstFrame {
        path: first.path().display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use crate::video::writer::testing::RecordingWriter;
    use crate::video::PixelOrder;
    use image::{Rgb, RgbImage};
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _root: TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let root = tempdir().unwrap();
        let input = root.path().join("input");
        let output = root.path().join("output");
        std::fs::create_dir(&input).unwrap();
        Fixture { _root: root, input, output }
    }

    fn config(fx: &Fixture) -> Config {
        let mut config = Config::default();
        config.input.directory = fx.input.clone();
        config.output.directory = fx.output.clone();
        config
    }

    fn write_image(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 3]) {
        RgbImage::from_pixel(width, height, Rgb(color))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_corrupt_image_is_skipped() {
        let fx = fixture();
        for i in (1..=10).filter(|i| *i != 4) {
            write_image(&fx.input, &format!("frame{}.jpg", i), 32, 24, [90, 90, 90]);
        }
        std::fs::write(fx.input.join("frame4.jpg"), b"not really a jpeg").unwrap();

        let mut writer = RecordingWriter::default();
        let mut sequencer = FrameSequencer::new(config(&fx)).unwrap();
        let summary = sequencer.convert_with(&mut writer).unwrap();

        assert_eq!(summary.total_entries, 10);
        assert_eq!(summary.frames_written, 9);
        assert_eq!(summary.frames_skipped, 1);
        assert_eq!(summary.skipped[0].path, fx.input.join("frame4.jpg"));
        assert_eq!(writer.frames.len(), 9);
        assert_eq!(writer.closes, 1);
        assert_eq!(sequencer.state(), RunState::Finalized);
    }

    #[test]
    fn test_configured_size_rescales_every_frame() {
        let fx = fixture();
        for i in 1..=3 {
            write_image(&fx.input, &format!("shot{}.png", i), 640, 480, [10, 20, 30]);
        }

        let mut config = config(&fx);
        config.video.frame_size = Some(FrameSize::new(320, 240));

        let mut writer = RecordingWriter::default();
        let summary = FrameSequencer::new(config).unwrap().convert_with(&mut writer).unwrap();

        assert_eq!(summary.frame_size, FrameSize::new(320, 240));
        let (path, spec) = writer.opened.clone().unwrap();
        assert_eq!(path, fx.output.join("output.mp4"));
        assert_eq!(spec.frame_size, FrameSize::new(320, 240));
        assert_eq!(writer.frames.len(), 3);
        assert!(writer.frames.iter().all(|f| f.size() == FrameSize::new(320, 240)));
    }

    #[test]
    fn test_first_image_fixes_size_for_the_run() {
        let fx = fixture();
        write_image(&fx.input, "a1.png", 64, 48, [0, 0, 0]);
        write_image(&fx.input, "a2.png", 30, 30, [0, 0, 0]);

        let mut writer = RecordingWriter::default();
        FrameSequencer::new(config(&fx)).unwrap().convert_with(&mut writer).unwrap();

        assert!(writer.frames.iter().all(|f| f.size() == FrameSize::new(64, 48)));
    }

    #[test]
    fn test_frames_follow_natural_order_in_bgr() {
        let fx = fixture();
        write_image(&fx.input, "img10.png", 4, 4, [0, 0, 255]);
        write_image(&fx.input, "img2.png", 4, 4, [0, 255, 0]);
        write_image(&fx.input, "img1.png", 4, 4, [255, 0, 0]);

        let mut writer = RecordingWriter::default();
        FrameSequencer::new(config(&fx)).unwrap().convert_with(&mut writer).unwrap();

        let firsts: Vec<[u8; 3]> = writer.frames.iter().map(|f| f.pixel(0, 0)).collect();
        assert_eq!(firsts, vec![[0, 0, 255], [0, 255, 0], [255, 0, 0]]);
        assert!(writer.frames.iter().all(|f| f.order() == PixelOrder::Bgr));
    }

    #[test]
    fn test_empty_directory_produces_no_output() {
        let fx = fixture();

        let mut writer = RecordingWriter::default();
        let mut sequencer = FrameSequencer::new(config(&fx)).unwrap();
        let err = sequencer.convert_with(&mut writer).unwrap_err();

        assert!(matches!(err, SequencerError::Scan(ScanError::NoValidImages { .. })));
        assert_eq!(sequencer.state(), RunState::Aborted);
        assert!(writer.opened.is_none());
        assert!(!fx.output.exists());
    }

    #[test]
    fn test_missing_input_directory() {
        let fx = fixture();
        let mut config = config(&fx);
        config.input.directory = fx.input.join("nope");

        let mut writer = RecordingWriter::default();
        let err = FrameSequencer::new(config).unwrap().convert_with(&mut writer).unwrap_err();
        assert!(matches!(err, SequencerError::Scan(ScanError::InputNotFound { .. })));
    }

    #[test]
    fn test_unreadable_first_frame_aborts() {
        let fx = fixture();
        std::fs::write(fx.input.join("a.jpg"), b"garbage").unwrap();
        write_image(&fx.input, "b.jpg", 16, 16, [1, 2, 3]);

        let mut writer = RecordingWriter::default();
        let mut sequencer = FrameSequencer::new(config(&fx)).unwrap();
        let err = sequencer.convert_with(&mut writer).unwrap_err();

        assert!(matches!(err, SequencerError::Video(VideoError::UnreadableFirstFrame { .. })));
        assert_eq!(sequencer.state(), RunState::Aborted);
        assert!(writer.opened.is_none());
    }

    #[test]
    fn test_configured_size_tolerates_unreadable_first_frame() {
        let fx = fixture();
        std::fs::write(fx.input.join("a.jpg"), b"garbage").unwrap();
        write_image(&fx.input, "b.jpg", 16, 16, [1, 2, 3]);

        let mut config = config(&fx);
        config.video.frame_size = Some(FrameSize::new(8, 8));

        let mut writer = RecordingWriter::default();
        let summary = FrameSequencer::new(config).unwrap().convert_with(&mut writer).unwrap();
        assert_eq!(summary.frames_written, 1);
        assert_eq!(summary.frames_skipped, 1);
    }

    #[test]
    fn test_writer_init_failure_aborts() {
        let fx = fixture();
        write_image(&fx.input, "1.png", 8, 8, [0, 0, 0]);

        let mut writer = RecordingWriter { fail_open: true, ..Default::default() };
        let mut sequencer = FrameSequencer::new(config(&fx)).unwrap();
        let err = sequencer.convert_with(&mut writer).unwrap_err();

        assert!(matches!(err, SequencerError::Video(VideoError::WriterInitFailed { .. })));
        assert_eq!(sequencer.state(), RunState::Aborted);
        assert_eq!(writer.closes, 0);
    }

    #[test]
    fn test_encoding_failure_still_releases_writer() {
        let fx = fixture();
        for i in 1..=3 {
            write_image(&fx.input, &format!("{}.png", i), 8, 8, [0, 0, 0]);
        }

        let mut writer = RecordingWriter { fail_on_frame: Some(1), ..Default::default() };
        let mut sequencer = FrameSequencer::new(config(&fx)).unwrap();
        let err = sequencer.convert_with(&mut writer).unwrap_err();

        assert!(matches!(err, SequencerError::Video(VideoError::EncodingFailed { .. })));
        assert_eq!(sequencer.state(), RunState::Aborted);
        assert_eq!(writer.frames.len(), 1);
        assert_eq!(writer.closes, 1);
    }

    #[test]
    fn test_progress_reported_per_entry() {
        let fx = fixture();
        write_image(&fx.input, "p1.png", 8, 8, [0, 0, 0]);
        std::fs::write(fx.input.join("p2.png"), b"broken").unwrap();
        write_image(&fx.input, "p3.png", 8, 8, [0, 0, 0]);

        let mut sequencer = FrameSequencer::new(config(&fx)).unwrap();
        let entries = sequencer.scan().unwrap();
        let size = sequencer.resolve_frame_size(&entries).unwrap();
        assert_eq!(sequencer.state(), RunState::SizeResolved);

        let mut seen = Vec::new();
        let mut writer = RecordingWriter::default();
        sequencer
            .run_with_progress(&entries, size, &mut writer, |p| {
                seen.push((p.index, p.total, p.file_name.to_string()))
            })
            .unwrap();

        assert_eq!(
            seen,
            vec![
                (1, 3, "p1.png".to_string()),
                (2, 3, "p2.png".to_string()),
                (3, 3, "p3.png".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.video.fps = -1.0;
        assert!(FrameSequencer::new(config).is_err());
    }

    #[test]
    fn test_resolve_prefers_configured_size() {
        let size = resolve_frame_size(&[], Some(FrameSize::new(320, 240))).unwrap();
        assert_eq!(size, FrameSize::new(320, 240));
        assert!(resolve_frame_size(&[], None).is_err());
    }
}

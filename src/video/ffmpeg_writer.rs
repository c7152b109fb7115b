use std::path::Path;

use ffmpeg_next as ffmpeg;
use tracing::info;

use crate::error::{Result, VideoError};
use crate::video::process_writer::quality_to_qscale;
use crate::video::types::{Frame, PixelOrder, StreamSpec};
use crate::video::writer::VideoWriter;

/// Encodes frames in-process through libav.
///
/// BGR24 input is converted to YUV420P with a bilinear swscale context
/// before being sent to the encoder.
pub struct FfmpegWriter {
    octx: Option<ffmpeg::format::context::Output>,
    encoder: Option<ffmpeg::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg::software::scaling::Context>,
    width: u32,
    height: u32,
    time_base: ffmpeg::Rational,
    frame_count: i64,
}

fn init_failed(e: impl std::fmt::Display) -> VideoError {
    VideoError::WriterInitFailed { reason: e.to_string() }
}

fn encode_failed(e: impl std::fmt::Display) -> VideoError {
    VideoError::EncodingFailed { reason: e.to_string() }
}

/// libav's lambda units per quantizer step (`FF_QP2LAMBDA`)
const QP2LAMBDA: u32 = 118;

/// Closest rational to `fps` whose terms fit mpeg4's 16-bit time base fields
fn frame_rate(fps: f64) -> ffmpeg::Rational {
    ffmpeg::Rational::from(unsafe { ffmpeg::ffi::av_d2q(fps, 65535) })
}

/// Fixed-quantizer encoder options for a 0-100 quality
fn quality_options(quality: u8) -> ffmpeg::Dictionary<'static> {
    let mut opts = ffmpeg::Dictionary::new();
    opts.set("flags", "+qscale");
    opts.set("global_quality", &(quality_to_qscale(quality) as u32 * QP2LAMBDA).to_string());
    opts
}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            time_base: ffmpeg::Rational(1, 30),
            frame_count: 0,
        }
    }

    /// Move every packet the encoder has ready into the container
    fn drain(&mut self) -> Result<()> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Ok(());
        };

        let ost_time_base = octx
            .stream(0)
            .ok_or_else(|| encode_failed("output stream missing"))?
            .time_base();

        let mut encoded = ffmpeg::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(octx).map_err(encode_failed)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn pixel_order(&self) -> PixelOrder {
        PixelOrder::Bgr
    }

    fn open(&mut self, path: &Path, spec: &StreamSpec) -> Result<()> {
        ffmpeg::init().map_err(init_failed)?;

        let width = spec.frame_size.width;
        let height = spec.frame_size.height;
        let fps = frame_rate(spec.fps);
        let time_base = fps.invert();

        let mut octx = ffmpeg::format::output(&path).map_err(init_failed)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg::encoder::find_by_name(&spec.codec)
            .ok_or_else(|| init_failed(format!("encoder '{}' not found", spec.codec)))?;

        let mut ost = octx.add_stream(Some(codec)).map_err(init_failed)?;

        let mut encoder_ctx = ffmpeg::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(init_failed)?;

        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(fps));

        if global_header {
            encoder_ctx.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx
            .open_with(quality_options(spec.quality))
            .map_err(init_failed)?;
        ost.set_parameters(&encoder);

        octx.write_header().map_err(init_failed)?;

        let scaler = ffmpeg::software::scaling::Context::get(
            ffmpeg::format::Pixel::BGR24,
            width,
            height,
            ffmpeg::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(init_failed)?;

        info!("Encoding {} @ {} fps with libav {}", spec.frame_size, spec.fps, spec.codec);

        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.width = width;
        self.height = height;
        self.time_base = time_base;
        self.frame_count = 0;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        if self.encoder.is_none() {
            return Err(encode_failed("FfmpegWriter: not opened").into());
        }
        if frame.width() != self.width || frame.height() != self.height {
            return Err(encode_failed(format!(
                "frame is {} but the stream is {}x{}",
                frame.size(),
                self.width,
                self.height
            ))
            .into());
        }

        let frame = frame.clone().into_order(PixelOrder::Bgr);
        let mut bgr_frame =
            ffmpeg::util::frame::video::Video::new(ffmpeg::format::Pixel::BGR24, self.width, self.height);

        // Copy pixel data, respecting stride
        let row_bytes = self.width as usize * 3;
        let stride = bgr_frame.stride(0);
        let dst = bgr_frame.data_mut(0);
        for (row, src) in frame.data().chunks_exact(row_bytes).enumerate() {
            dst[row * stride..row * stride + row_bytes].copy_from_slice(src);
        }

        let mut yuv_frame = ffmpeg::util::frame::video::Video::empty();
        if let Some(scaler) = self.scaler.as_mut() {
            scaler.run(&bgr_frame, &mut yuv_frame).map_err(encode_failed)?;
        }
        yuv_frame.set_pts(Some(self.frame_count));

        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_frame(&yuv_frame).map_err(encode_failed)?;
        }
        self.drain()?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_eof().map_err(encode_failed)?;
            self.drain()?;
            if let Some(octx) = self.octx.as_mut() {
                octx.write_trailer().map_err(encode_failed)?;
            }
        }

        self.octx = None;
        self.encoder = None;
        self.scaler = None;
        Ok(())
    }
}

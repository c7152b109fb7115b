use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::io::Reader as ImageReader;
use image::RgbImage;
use tracing::debug;

use crate::error::VideoError;
use crate::video::types::{Frame, FrameSize, ResizeFilter};

/// Decodes still images into frames of a fixed size
pub struct ImageDecoder {
    filter: ResizeFilter,
}

/// Open `path` with its format sniffed from the leading bytes, so a PNG
/// named `.jpg` still decodes
fn reader(path: &Path) -> Result<ImageReader<BufReader<File>>, VideoError> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| decoding_failed(path, e))
}

fn decoding_failed(path: &Path, e: impl std::fmt::Display) -> VideoError {
    VideoError::DecodingFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

impl ImageDecoder {
    pub fn new(filter: ResizeFilter) -> Self {
        Self { filter }
    }

    /// Read only the image header to learn its natural dimensions
    pub fn probe_size<P: AsRef<Path>>(path: P) -> Result<FrameSize, VideoError> {
        let path = path.as_ref();
        let (width, height) = reader(path)?
            .into_dimensions()
            .map_err(|e| decoding_failed(path, e))?;
        Ok(FrameSize::new(width, height))
    }

    /// Decode an image to RGB, rescaling it when it does not match `target`
    pub fn decode<P: AsRef<Path>>(&self, path: P, target: FrameSize) -> Result<Frame, VideoError> {
        let path = path.as_ref();
        let image = reader(path)?
            .decode()
            .map_err(|e| decoding_failed(path, e))?
            .to_rgb8();

        Ok(Frame::from_rgb_image(self.fit(image, target)))
    }

    fn fit(&self, image: RgbImage, target: FrameSize) -> RgbImage {
        if image.dimensions() == (target.width, target.height) {
            return image;
        }

        debug!(
            "Resizing {}x{} -> {} ({:?})",
            image.width(),
            image.height(),
            target,
            self.filter
        );
        image::imageops::resize(&image, target.width, target.height, self.filter.filter_type())
    }
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self::new(ResizeFilter::default())
    }
}

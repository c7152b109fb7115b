use std::fmt;
use std::str::FromStr;

use image::imageops::FilterType;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Channel order of a frame's interleaved 8-bit samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelOrder {
    Rgb,
    Bgr,
}

/// One decoded picture, 3 channels at one byte each
///
/// Frames are produced by the decoder in RGB and converted to whatever order
/// the writer expects right before they are handed over.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    order: PixelOrder,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            order: PixelOrder::Rgb,
        }
    }

    /// Create a frame from raw interleaved bytes, `None` if the length does not match
    pub fn from_raw(width: u32, height: u32, order: PixelOrder, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * 3 {
            return None;
        }
        Some(Self { data, width, height, order })
    }

    /// Get the width of the frame
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the height of the frame
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub fn order(&self) -> PixelOrder {
        self.order
    }

    /// Interleaved pixel bytes, row-major with no padding
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a pixel at the given coordinates, in the frame's own channel order
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Reorder channels in place; RGB and BGR differ only by swapping the outer samples
    pub fn into_order(mut self, order: PixelOrder) -> Self {
        if self.order != order {
            for px in self.data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            self.order = order;
        }
        self
    }
}

/// Output frame dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses the `"<width>,<height>"` form used on the command line
impl FromStr for FrameSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidFrameSize {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(invalid("expected <width>,<height>"));
        }

        let width: u32 = parts[0].parse().map_err(|_| invalid("width is not a positive integer"))?;
        let height: u32 = parts[1].parse().map_err(|_| invalid("height is not a positive integer"))?;

        if width == 0 || height == 0 {
            return Err(invalid("dimensions must be non-zero"));
        }

        Ok(Self { width, height })
    }
}

/// Resampling filter used when an image does not match the frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Bilinear,
    Lanczos3,
}

impl ResizeFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Parameters a writer is opened with
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSpec {
    pub frame_size: FrameSize,
    pub fps: f64,
    /// FFmpeg encoder name, e.g. `mpeg4`
    pub codec: String,
    /// 0-100, higher is better
    pub quality: u8,
}

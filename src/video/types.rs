use std::fmt;
use std::str::FromStr;

use image::imageops::FilterType;
use image::{ImageBuffer, Rgb, RgbImage};

/// Represents a single video frame
///
/// This is a simple wrapper around an RGB image buffer. Channels are stored in
/// red, green, blue order and every sample is an 8-bit value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with black
    pub fn new_black(width: u32, height: u32) -> Self {
        Self {
            buffer: ImageBuffer::new(width, height),
        }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            buffer: ImageBuffer::from_pixel(width, height, Rgb(color)),
        }
    }

    /// Create a frame whose pixels are produced by `f(x, y)`
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 3],
    {
        Self {
            buffer: ImageBuffer::from_fn(width, height, |x, y| Rgb(f(x, y))),
        }
    }

    /// Create a frame from raw RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// `(width, height)` of the frame
    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Interleaved RGB samples, row-major
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Number of bytes a `width` x `height` RGB frame occupies
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }

    /// Resample the frame to exactly `width` x `height`
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        Frame::new(image::imageops::resize(
            &self.buffer,
            width,
            height,
            FilterType::Triangle,
        ))
    }
}

/// Rational frame rate as reported by the demuxer, e.g. `30000/1001`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    num: u32,
    den: u32,
}

impl FrameRate {
    /// Returns `None` unless both parts are positive
    pub fn new(num: u32, den: u32) -> Option<Self> {
        (num > 0 && den > 0).then_some(Self { num, den })
    }

    /// Approximate a decimal rate; whole numbers stay exact
    pub fn from_fps(fps: f64) -> Option<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return None;
        }
        if fps.fract() == 0.0 && fps <= u32::MAX as f64 {
            return Self::new(fps as u32, 1);
        }
        let num = (fps * 1000.0).round();
        if num > u32::MAX as f64 {
            return None;
        }
        Self::new(num as u32, 1000)
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for FrameRate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.split_once('/') {
            Some((num, den)) => {
                let num: u32 = num.trim().parse().map_err(|_| format!("bad frame rate '{}'", s))?;
                let den: u32 = den.trim().parse().map_err(|_| format!("bad frame rate '{}'", s))?;
                Self::new(num, den)
            }
            None => {
                let fps: f64 = s.parse().map_err(|_| format!("bad frame rate '{}'", s))?;
                Self::from_fps(fps)
            }
        };
        parsed.ok_or_else(|| format!("frame rate must be positive, got '{}'", s))
    }
}

/// Properties of an opened input stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,

    /// Total frame count, when the container reports one
    pub frame_count: Option<u64>,
}

impl StreamInfo {
    pub fn fps(&self) -> f64 {
        self.frame_rate.as_f64()
    }
}

//! In-memory frame model for one recording session.

use std::fmt;

use image::{ImageBuffer, Rgb, RgbImage};
use tenet_common::error::{TenetError, TenetResult};

/// Bytes per pixel of a packed RGB frame.
pub const BYTES_PER_PIXEL: usize = 3;

/// Width and height of a frame or device, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Length of a tightly packed RGB frame of this size.
    pub fn packed_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }

    /// Length of one tightly packed row.
    pub fn row_len(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A single captured picture, packed RGB, 8 bits per channel.
///
/// Frames own their pixels; nothing aliases the device's buffers once a
/// frame has been produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
    }

    /// Build a frame from tightly packed RGB bytes.
    pub fn from_rgb(geometry: Geometry, data: Vec<u8>) -> TenetResult<Self> {
        let len = data.len();
        ImageBuffer::from_raw(geometry.width, geometry.height, data)
            .map(Self::from_image)
            .ok_or_else(|| {
                TenetError::frame_read(format!(
                    "{len} bytes do not hold a {geometry} RGB frame ({} expected)",
                    geometry.packed_len()
                ))
            })
    }

    /// A frame of uniform colour.
    pub fn filled(geometry: Geometry, rgb: [u8; 3]) -> Self {
        Self::from_image(ImageBuffer::from_pixel(
            geometry.width,
            geometry.height,
            Rgb(rgb),
        ))
    }

    /// Copy rows out of a buffer whose lines are `stride` bytes apart.
    pub fn from_strided(geometry: Geometry, stride: usize, data: &[u8]) -> TenetResult<Self> {
        let row_len = geometry.row_len();
        if stride == row_len {
            let packed = data
                .get(..geometry.packed_len())
                .ok_or_else(|| short_buffer(geometry, data.len()))?;
            return Self::from_rgb(geometry, packed.to_vec());
        }

        let mut packed = Vec::with_capacity(geometry.packed_len());
        for row in 0..geometry.height as usize {
            let start = row * stride;
            let line = data
                .get(start..start + row_len)
                .ok_or_else(|| short_buffer(geometry, data.len()))?;
            packed.extend_from_slice(line);
        }
        Self::from_rgb(geometry, packed)
    }

    /// Pixels laid out with `stride` bytes per row (padding zeroed).
    pub fn to_strided(&self, stride: usize) -> Vec<u8> {
        let row_len = self.geometry().row_len();
        if stride <= row_len {
            return self.image.as_raw().clone();
        }

        let mut out = vec![0u8; stride * self.image.height() as usize];
        for (row, line) in self.image.as_raw().chunks_exact(row_len).enumerate() {
            out[row * stride..row * stride + row_len].copy_from_slice(line);
        }
        out
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.image.width(), self.image.height())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }
}

fn short_buffer(geometry: Geometry, len: usize) -> TenetError {
    TenetError::frame_read(format!(
        "Buffer of {len} bytes is too short for a {geometry} frame"
    ))
}

/// Ordered frames of one session: appended during capture, then read
/// forward and backward during export.
#[derive(Debug, Default, Clone)]
pub struct FrameBuffer {
    frames: Vec<Frame>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in capture order.
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Frames in reverse capture order.
    pub fn iter_reversed(&self) -> std::iter::Rev<std::slice::Iter<'_, Frame>> {
        self.frames.iter().rev()
    }

    /// Geometry of the first buffered frame.
    pub fn geometry(&self) -> Option<Geometry> {
        self.frames.first().map(Frame::geometry)
    }
}

impl<'a> IntoIterator for &'a FrameBuffer {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

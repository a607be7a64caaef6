//! Synthetic test-pattern device.
//!
//! Produces frames at a fixed rate without any hardware, so the full
//! record/export path can be exercised on headless machines. Every frame
//! differs from its neighbours (a marker sweeps across the picture and the
//! bottom band encodes the frame index), which makes reversal visible.

use std::time::{Duration, Instant};

use image::{ImageBuffer, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use tenet_common::error::{TenetError, TenetResult};

use crate::backend::VideoDevice;
use crate::frame::{Frame, Geometry};

/// Create the pattern for frame `index`.
pub fn create_sweep_pattern(geometry: Geometry, index: u64) -> RgbImage {
    let Geometry { width, height } = geometry;
    let mut img = ImageBuffer::from_pixel(width, height, Rgb([40, 40, 50]));

    // Horizontal gradient in the top third
    for y in 0..height / 3 {
        for x in 0..width {
            let intensity = (x * 255 / width.max(1)) as u8;
            img.put_pixel(x, y, Rgb([intensity, intensity / 2, 255 - intensity]));
        }
    }

    // Sweeping marker
    let radius = (height / 10).max(2) as i32;
    let travel = width.saturating_sub(2 * radius as u32).max(1) as u64;
    let x = radius as u64 + (index * 8) % travel;
    draw_filled_circle_mut(
        &mut img,
        (x as i32, (height / 2) as i32),
        radius,
        Rgb([50, 255, 50]),
    );

    // Frame index, one byte per channel, in the bottom band
    let band = Rgb([
        (index & 0xff) as u8,
        ((index >> 8) & 0xff) as u8,
        ((index >> 16) & 0xff) as u8,
    ]);
    for y in height.saturating_sub(height / 8).max(height / 2 + 1)..height {
        for x in 0..width {
            img.put_pixel(x, y, band);
        }
    }

    img
}

/// Recover the frame index written by [`create_sweep_pattern`].
pub fn decode_sweep_index(frame: &Frame) -> Option<u64> {
    let Geometry { height, .. } = frame.geometry();
    let [r, g, b] = frame.pixel(0, height.checked_sub(1)?)?;
    Some(r as u64 | (g as u64) << 8 | (b as u64) << 16)
}

/// A [`VideoDevice`] that paces generated frames at `fps`.
pub struct SyntheticDevice {
    geometry: Geometry,
    frame_interval: Duration,
    next_due: Option<Instant>,
    index: u64,
    open: bool,
}

impl SyntheticDevice {
    pub fn new(geometry: Geometry, fps: u32) -> Self {
        Self {
            geometry,
            frame_interval: Duration::from_secs(1) / fps.max(1),
            next_due: None,
            index: 0,
            open: true,
        }
    }

    pub fn frames_produced(&self) -> u64 {
        self.index
    }
}

impl VideoDevice for SyntheticDevice {
    fn read_frame(&mut self) -> TenetResult<Frame> {
        if !self.open {
            return Err(TenetError::capture("Synthetic device has been released"));
        }

        let now = Instant::now();
        if let Some(due) = self.next_due {
            if due > now {
                std::thread::sleep(due - now);
            }
        }
        self.next_due = Some(self.next_due.unwrap_or(now) + self.frame_interval);

        let frame = Frame::from_image(create_sweep_pattern(self.geometry, self.index));
        self.index += 1;
        Ok(frame)
    }

    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn release(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

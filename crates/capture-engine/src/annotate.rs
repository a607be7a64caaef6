//! Recording indicator drawn on the live preview.
//!
//! The indicator is a filled disc drawn into the pixels of a display copy
//! plus a short caption the preview surface renders next to it. Buffered
//! frames are never passed through here.

use image::Rgb;
use imageproc::drawing::draw_filled_circle_mut;

use crate::frame::Frame;

/// Text rendered by a preview surface on top of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub text: String,
    /// Left edge and baseline of the text, in frame pixels.
    pub origin: (i32, i32),
    pub color: [u8; 3],
}

/// Fixed-position "recording" marker for the capture preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingIndicator {
    pub center: (i32, i32),
    pub radius: i32,
    pub color: [u8; 3],
    pub label: Caption,
}

impl Default for RecordingIndicator {
    fn default() -> Self {
        let red = [255, 0, 0];
        Self {
            center: (30, 30),
            radius: 10,
            color: red,
            label: Caption {
                text: "RECORDING".to_string(),
                origin: (50, 40),
                color: red,
            },
        }
    }
}

impl RecordingIndicator {
    /// Draw the marker disc into `frame`.
    pub fn draw_marker(&self, frame: &mut Frame) {
        draw_filled_circle_mut(frame.image_mut(), self.center, self.radius, Rgb(self.color));
    }

    /// Copy `frame` and mark the copy; `frame` itself is left untouched.
    pub fn annotate(&self, frame: &Frame) -> Frame {
        let mut display = frame.clone();
        self.draw_marker(&mut display);
        display
    }

    pub fn caption(&self) -> &Caption {
        &self.label
    }
}

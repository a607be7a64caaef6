use std::path::Path;
use std::time::Duration;

use tenet_common::config::AppConfig;
use tenet_common::error::TenetResult;

use crate::annotate::Caption;
use crate::frame::{Frame, Geometry};

/// An open video input device.
pub trait VideoDevice {
    /// Pull one frame, blocking until the device delivers it.
    ///
    /// `TenetError::FrameRead` means this read failed but the device is still
    /// usable; any other error means the device is gone.
    fn read_frame(&mut self) -> TenetResult<Frame>;

    /// Geometry the device currently reports.
    fn geometry(&self) -> Geometry;

    /// Stop the device. Further reads fail.
    fn release(&mut self);

    /// Whether the device can still deliver frames. The recorder stops
    /// with an error once this turns false.
    fn is_open(&self) -> bool;
}

/// An on-screen window frames can be rendered into.
pub trait PreviewSurface {
    /// Render `frame`, optionally with a caption drawn on top.
    fn show(&mut self, frame: &Frame, caption: Option<&Caption>) -> TenetResult<()>;

    /// Block for up to `wait` and return a key pressed in the window since
    /// the last poll, if any.
    fn poll_key(&mut self, wait: Duration) -> Option<char>;

    /// Tear the window down. Safe to call more than once.
    fn close(&mut self);
}

/// A write-only, sequential video file encoder.
pub trait VideoEncoder {
    fn write(&mut self, frame: &Frame) -> TenetResult<()>;

    /// Flush and close the file.
    fn finish(&mut self) -> TenetResult<()>;
}

/// Fixed parameters shared by both output files of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub geometry: Geometry,
    pub fps: u32,
    pub fourcc: String,
}

/// Abstract source of devices, windows, and encoders.
pub trait CaptureBackend {
    fn open_device(&self, index: u32) -> TenetResult<Box<dyn VideoDevice>>;

    fn open_preview(&self, title: &str) -> TenetResult<Box<dyn PreviewSurface>>;

    fn open_encoder(
        &self,
        path: &Path,
        settings: &EncoderSettings,
    ) -> TenetResult<Box<dyn VideoEncoder>>;

    fn name(&self) -> &str;
}

/// Surface used when previews are disabled: shows nothing, reports no keys.
#[derive(Debug, Default)]
pub struct NullPreview {
    frames_shown: u64,
}

impl NullPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }
}

impl PreviewSurface for NullPreview {
    fn show(&mut self, _frame: &Frame, _caption: Option<&Caption>) -> TenetResult<()> {
        self.frames_shown += 1;
        Ok(())
    }

    fn poll_key(&mut self, _wait: Duration) -> Option<char> {
        None
    }

    fn close(&mut self) {}
}

pub mod camera;

pub use camera::{CameraBackend, DeviceSource};

/// Build the backend described by `config`.
pub fn get_backend(config: &AppConfig, synthetic: bool) -> Box<dyn CaptureBackend> {
    let source = if synthetic {
        DeviceSource::Synthetic {
            geometry: Geometry::new(640, 480),
            fps: config.recording.fps,
        }
    } else {
        DeviceSource::Camera
    };
    Box::new(CameraBackend::new(
        source,
        config.recording.preview,
        config.recording.device_open_timeout(),
    ))
}

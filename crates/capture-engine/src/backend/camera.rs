use std::path::Path;
use std::time::Duration;

use tenet_common::error::{TenetError, TenetResult};

use crate::backend::{
    CaptureBackend, EncoderSettings, NullPreview, PreviewSurface, VideoDevice, VideoEncoder,
};
use crate::frame::Geometry;
use crate::pipeline::{GstCamera, GstEncoder, GstPreview};
use crate::synthetic::SyntheticDevice;

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSource {
    /// The platform camera at the requested index.
    Camera,
    /// Generated test pattern, for machines without a camera.
    Synthetic { geometry: Geometry, fps: u32 },
}

/// GStreamer-backed camera, preview windows, and file encoders.
pub struct CameraBackend {
    source: DeviceSource,
    preview: bool,
    open_timeout: Duration,
}

impl CameraBackend {
    pub fn new(source: DeviceSource, preview: bool, open_timeout: Duration) -> Self {
        Self {
            source,
            preview,
            open_timeout,
        }
    }
}

impl Default for CameraBackend {
    fn default() -> Self {
        Self::new(DeviceSource::Camera, true, Duration::from_secs(5))
    }
}

impl CaptureBackend for CameraBackend {
    fn open_device(&self, index: u32) -> TenetResult<Box<dyn VideoDevice>> {
        match &self.source {
            DeviceSource::Camera => {
                let camera = GstCamera::open(index, self.open_timeout)?;
                tracing::info!(
                    index,
                    geometry = %camera.geometry(),
                    "Opened camera"
                );
                Ok(Box::new(camera))
            }
            DeviceSource::Synthetic { geometry, fps } => {
                if geometry.is_empty() || *fps == 0 {
                    return Err(TenetError::device_unavailable(format!(
                        "Synthetic device needs a non-empty geometry and fps, got {geometry}@{fps}"
                    )));
                }
                tracing::info!(%geometry, fps, "Opened synthetic test-pattern device");
                Ok(Box::new(SyntheticDevice::new(*geometry, *fps)))
            }
        }
    }

    fn open_preview(&self, title: &str) -> TenetResult<Box<dyn PreviewSurface>> {
        if !self.preview {
            tracing::debug!(title, "Preview disabled; using null surface");
            return Ok(Box::new(NullPreview::new()));
        }
        Ok(Box::new(GstPreview::new(title)?))
    }

    fn open_encoder(
        &self,
        path: &Path,
        settings: &EncoderSettings,
    ) -> TenetResult<Box<dyn VideoEncoder>> {
        Ok(Box::new(GstEncoder::create(path, settings)?))
    }

    fn name(&self) -> &str {
        match self.source {
            DeviceSource::Camera => "gstreamer-camera",
            DeviceSource::Synthetic { .. } => "gstreamer-synthetic",
        }
    }
}

//! Capture-and-invert recording.
//!
//! A [`TenetRecorder`] owns one video device for its whole life. It buffers
//! every frame captured during [`record`](TenetRecorder::record), shows a
//! marked copy in a live preview, and on [`export`](TenetRecorder::export)
//! writes the buffer twice: once in capture order and once reversed.

use std::path::PathBuf;
use std::time::Duration;

use tenet_common::clock::{RecordingClock, SessionStamp};
use tenet_common::config::AppConfig;
use tenet_common::error::{TenetError, TenetResult};

use crate::annotate::{Caption, RecordingIndicator};
use crate::backend::{
    CaptureBackend, EncoderSettings, NullPreview, PreviewSurface, VideoDevice, VideoEncoder,
};
use crate::frame::{Frame, FrameBuffer, Geometry};
use crate::output::{ArtifactKind, ArtifactPaths};

/// Title of the live window shown while capturing.
pub const CAPTURE_WINDOW_TITLE: &str = "Tenet Recording";

/// Title of the window that plays the reversed sequence during export.
pub const PLAYBACK_WINDOW_TITLE: &str = "Inverted Playback";

/// Settings for one recorder.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Directory the two output files are written into.
    pub output_dir: PathBuf,

    /// Default capture length used by [`TenetRecorder::run`].
    pub duration: Duration,

    /// Frame rate stamped on both output files.
    pub fps: u32,

    /// Four-character codec tag.
    pub fourcc: String,

    /// Container extension, without the dot.
    pub extension: String,

    pub device_index: u32,

    /// Key poll after each captured frame.
    pub poll_interval: Duration,

    /// Delay between frames of the reversed playback.
    pub playback_interval: Duration,

    pub indicator: RecordingIndicator,
}

impl RecorderConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        let recording = &config.recording;
        Self {
            output_dir: config.output_dir.clone(),
            duration: recording.duration(),
            fps: recording.fps,
            fourcc: recording.fourcc.clone(),
            extension: recording.container_extension.clone(),
            device_index: recording.device_index,
            poll_interval: recording.poll_interval(),
            playback_interval: recording.playback_interval(),
            indicator: RecordingIndicator::default(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

/// What happened during [`TenetRecorder::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSummary {
    /// Frames added to the buffer.
    pub frames_captured: usize,

    /// Reads that failed and were dropped.
    pub frames_skipped: usize,

    /// Whether the cancel key ended the capture early.
    pub cancelled: bool,

    pub elapsed: Duration,
}

/// The two files written by [`TenetRecorder::export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPair {
    pub stamp: SessionStamp,
    pub original: PathBuf,
    pub inverted: PathBuf,

    /// Frames handed to each encoder.
    pub frames_written: usize,

    /// Individual writes that failed, across both files.
    pub write_failures: usize,

    pub geometry: Geometry,
}

/// End state of [`TenetRecorder::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Both files were written.
    Exported {
        summary: RecordSummary,
        pair: ExportedPair,
    },
    /// Nothing was captured, so nothing was written.
    EmptySession { summary: RecordSummary },
    /// Recording or export failed with this message.
    Failed(String),
}

impl RunOutcome {
    pub fn pair(&self) -> Option<&ExportedPair> {
        match self {
            Self::Exported { pair, .. } => Some(pair),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Records from one device and exports forward and reversed copies.
pub struct TenetRecorder {
    config: RecorderConfig,
    backend: Box<dyn CaptureBackend>,
    device: Option<Box<dyn VideoDevice>>,
    frames: FrameBuffer,
    capture_preview: Option<Box<dyn PreviewSurface>>,
    playback_preview: Option<Box<dyn PreviewSurface>>,
}

impl TenetRecorder {
    /// Open the configured device and make sure the output directory exists.
    ///
    /// Any failure to open the device is reported as `DeviceUnavailable`.
    pub fn initialize(config: RecorderConfig, backend: Box<dyn CaptureBackend>) -> TenetResult<Self> {
        let device = backend
            .open_device(config.device_index)
            .map_err(|e| match e {
                TenetError::DeviceUnavailable { .. } => e,
                other => TenetError::device_unavailable(format!(
                    "Could not open video device {}: {other}",
                    config.device_index
                )),
            })?;

        std::fs::create_dir_all(&config.output_dir)?;

        tracing::info!(
            backend = backend.name(),
            device = config.device_index,
            geometry = %device.geometry(),
            output_dir = %config.output_dir.display(),
            "Recorder initialized"
        );

        Ok(Self {
            config,
            backend,
            device: Some(device),
            frames: FrameBuffer::new(),
            capture_preview: None,
            playback_preview: None,
        })
    }

    /// Frames buffered so far.
    pub fn frames(&self) -> &FrameBuffer {
        &self.frames
    }

    /// Whether the device has been handed back.
    pub fn is_released(&self) -> bool {
        self.device.is_none()
    }

    /// Capture until `duration` has elapsed or `q`/`Q` is pressed.
    pub fn record(&mut self, duration: Duration) -> TenetResult<RecordSummary> {
        let result = self.capture_loop(duration);
        if let Some(mut preview) = self.capture_preview.take() {
            preview.close();
        }
        let summary = result?;

        tracing::info!(
            frames = summary.frames_captured,
            skipped = summary.frames_skipped,
            cancelled = summary.cancelled,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Recording finished"
        );
        Ok(summary)
    }

    fn capture_loop(&mut self, duration: Duration) -> TenetResult<RecordSummary> {
        let device = self
            .device
            .as_mut()
            .ok_or_else(|| TenetError::capture("Recorder has already been torn down"))?;

        let clock = RecordingClock::start();
        tracing::info!(
            duration_secs = duration.as_secs_f64(),
            started_at = clock.epoch_wall(),
            "Recording started"
        );
        let mut captured = 0;
        let mut skipped = 0;
        let mut cancelled = false;

        while !clock.has_elapsed(duration) {
            if !device.is_open() {
                return Err(TenetError::capture("Video device closed during recording"));
            }
            let frame = match device.read_frame() {
                Ok(frame) => frame,
                Err(e) if e.is_frame_skip() => {
                    tracing::trace!(error = %e, "Dropped frame");
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let display = self.config.indicator.annotate(&frame);
            self.frames.push(frame);
            captured += 1;

            let preview = show_or_fall_back(
                &mut self.capture_preview,
                self.backend.as_ref(),
                CAPTURE_WINDOW_TITLE,
                &display,
                Some(self.config.indicator.caption()),
            );

            if let Some(key) = preview.poll_key(self.config.poll_interval) {
                if key.eq_ignore_ascii_case(&'q') {
                    tracing::info!("Recording cancelled from preview window");
                    cancelled = true;
                    break;
                }
            }
        }

        Ok(RecordSummary {
            frames_captured: captured,
            frames_skipped: skipped,
            cancelled,
            elapsed: clock.elapsed(),
        })
    }

    /// Write the buffer forward and reversed, then discard it.
    ///
    /// Returns `Ok(None)` without touching the disk when nothing was
    /// captured.
    pub fn export(&mut self) -> TenetResult<Option<ExportedPair>> {
        if self.frames.is_empty() {
            tracing::warn!("No frames captured; skipping export");
            return Ok(None);
        }

        let frames = std::mem::take(&mut self.frames);
        let result = self.write_artifacts(&frames);
        if let Some(mut preview) = self.playback_preview.take() {
            preview.close();
        }
        result.map(Some)
    }

    fn write_artifacts(&mut self, frames: &FrameBuffer) -> TenetResult<ExportedPair> {
        let geometry = self
            .device
            .as_ref()
            .map(|device| device.geometry())
            .filter(|geometry| !geometry.is_empty())
            .or_else(|| frames.geometry())
            .ok_or_else(|| TenetError::encode("Cannot determine output geometry"))?;

        let paths = ArtifactPaths::new(
            &self.config.output_dir,
            SessionStamp::now(),
            &self.config.extension,
        );
        let settings = EncoderSettings {
            geometry,
            fps: self.config.fps,
            fourcc: self.config.fourcc.clone(),
        };

        tracing::info!(
            frames = frames.len(),
            %geometry,
            fps = settings.fps,
            fourcc = %settings.fourcc,
            stamp = %paths.stamp,
            "Exporting recording"
        );

        let mut original = self.backend.open_encoder(&paths.original, &settings)?;
        let mut inverted = self.backend.open_encoder(&paths.inverted, &settings)?;
        let mut write_failures = 0;

        for frame in frames.iter() {
            write_failures += write_logged(original.as_mut(), frame, &paths, ArtifactKind::Original);
        }
        original.finish()?;
        tracing::info!(path = %paths.original.display(), "Original sequence written");

        for frame in frames.iter_reversed() {
            write_failures += write_logged(inverted.as_mut(), frame, &paths, ArtifactKind::Inverted);

            let preview = show_or_fall_back(
                &mut self.playback_preview,
                self.backend.as_ref(),
                PLAYBACK_WINDOW_TITLE,
                frame,
                None,
            );
            // Pacing only; keys are ignored during playback.
            let _ = preview.poll_key(self.config.playback_interval);
        }
        inverted.finish()?;
        tracing::info!(path = %paths.inverted.display(), "Inverted sequence written");

        if write_failures > 0 {
            tracing::warn!(write_failures, "Some frames could not be written");
        }

        Ok(ExportedPair {
            stamp: paths.stamp,
            original: paths.original,
            inverted: paths.inverted,
            frames_written: frames.len(),
            write_failures,
            geometry,
        })
    }

    /// Record for the configured duration, export, and tear down.
    ///
    /// Never returns an error: failures are logged and reported as
    /// [`RunOutcome::Failed`].
    pub fn run(&mut self) -> RunOutcome {
        let outcome = match self.record_and_export(self.config.duration) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Recording failed");
                RunOutcome::Failed(e.to_string())
            }
        };
        self.teardown();
        outcome
    }

    fn record_and_export(&mut self, duration: Duration) -> TenetResult<RunOutcome> {
        let summary = self.record(duration)?;
        match self.export()? {
            Some(pair) => {
                tracing::info!(
                    original = %pair.original.display(),
                    inverted = %pair.inverted.display(),
                    "Recording exported"
                );
                Ok(RunOutcome::Exported { summary, pair })
            }
            None => Ok(RunOutcome::EmptySession { summary }),
        }
    }

    /// Release the device and close any open windows. Safe to call more
    /// than once; only the first call has an effect.
    pub fn teardown(&mut self) {
        if let Some(mut preview) = self.capture_preview.take() {
            preview.close();
        }
        if let Some(mut preview) = self.playback_preview.take() {
            preview.close();
        }
        if let Some(mut device) = self.device.take() {
            device.release();
            tracing::debug!("Video device released");
        }
    }
}

impl Drop for TenetRecorder {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Show a frame in the window held by `slot`, opening it on first use.
///
/// A window that cannot be opened or drawn is swapped for a [`NullPreview`]
/// so the recording carries on without it.
fn show_or_fall_back<'a>(
    slot: &'a mut Option<Box<dyn PreviewSurface>>,
    backend: &dyn CaptureBackend,
    title: &str,
    frame: &Frame,
    caption: Option<&Caption>,
) -> &'a mut Box<dyn PreviewSurface> {
    let preview = slot.get_or_insert_with(|| {
        backend.open_preview(title).unwrap_or_else(|e| {
            tracing::warn!(title, error = %e, "Preview unavailable; continuing without it");
            Box::new(NullPreview::new())
        })
    });
    if let Err(e) = preview.show(frame, caption) {
        tracing::warn!(title, error = %e, "Preview failed; continuing without it");
        preview.close();
        *preview = Box::new(NullPreview::new());
    }
    preview
}

/// Write one frame, logging a failure instead of returning it. Returns the
/// number of failed writes (0 or 1).
fn write_logged(
    encoder: &mut dyn VideoEncoder,
    frame: &Frame,
    paths: &ArtifactPaths,
    kind: ArtifactKind,
) -> usize {
    match encoder.write(frame) {
        Ok(()) => 0,
        Err(e) => {
            tracing::warn!(
                path = %paths.path(kind).display(),
                error = %e,
                "Frame write failed; continuing"
            );
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenet_common::config::AppConfig;

    #[test]
    fn test_config_from_defaults() {
        let config = RecorderConfig::from_app_config(&AppConfig::default());
        assert_eq!(config.output_dir, PathBuf::from("tenet_recordings"));
        assert_eq!(config.duration, Duration::from_secs(10));
        assert_eq!(config.fps, 30);
        assert_eq!(config.fourcc, "XVID");
        assert_eq!(config.extension, "avi");
        assert_eq!(config.device_index, 0);
        assert_eq!(config.poll_interval, Duration::from_millis(1));
        assert_eq!(config.playback_interval, Duration::from_millis(33));
    }

    #[test]
    fn test_run_outcome_accessors() {
        let failed = RunOutcome::Failed("boom".to_string());
        assert!(failed.is_failed());
        assert!(failed.pair().is_none());

        let empty = RunOutcome::EmptySession {
            summary: RecordSummary {
                frames_captured: 0,
                frames_skipped: 0,
                cancelled: false,
                elapsed: Duration::ZERO,
            },
        };
        assert!(!empty.is_failed());
        assert!(empty.pair().is_none());
    }
}

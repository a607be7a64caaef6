//! GStreamer pipelines for the camera, preview windows, and file encoders.
//!
//! ```text
//! camera:  <platform src> ! videoconvert ! RGB ! appsink
//! preview: appsrc ! videoconvert ! textoverlay ! videoconvert ! autovideosink
//! encoder: appsrc ! videoconvert ! <codec> ! <muxer> ! filesink
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use tenet_common::error::{TenetError, TenetResult};

use crate::annotate::Caption;
use crate::backend::{EncoderSettings, PreviewSurface, VideoDevice, VideoEncoder};
use crate::frame::{Frame, Geometry};

/// Longest a single camera read may block.
const FRAME_READ_TIMEOUT: Duration = Duration::from_millis(500);

const EOS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Approximate ascent of the caption font, used to turn a baseline origin
/// into textoverlay's top padding.
const CAPTION_ASCENT_PX: i32 = 22;

/// Video codecs selectable by four-character tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// MPEG-4 Part 2 (XVID/DIVX family).
    Mpeg4Part2,
    /// Motion JPEG.
    Mjpeg,
    /// H.264 / AVC.
    H264,
}

impl VideoCodec {
    pub fn from_fourcc(fourcc: &str) -> TenetResult<Self> {
        match fourcc.to_ascii_uppercase().as_str() {
            "XVID" | "DIVX" | "DX50" | "FMP4" | "MP4V" => Ok(Self::Mpeg4Part2),
            "MJPG" => Ok(Self::Mjpeg),
            "H264" | "X264" | "AVC1" => Ok(Self::H264),
            _ => Err(TenetError::config(format!(
                "Unsupported codec tag {fourcc:?} (expected XVID, MJPG or H264)"
            ))),
        }
    }

    fn encoder_fragment(self, fps: u32) -> String {
        match self {
            Self::Mpeg4Part2 => "avenc_mpeg4 bitrate=4000000".to_string(),
            Self::Mjpeg => "jpegenc quality=90".to_string(),
            Self::H264 => {
                let keyint = fps.saturating_mul(2).max(2);
                format!("x264enc speed-preset=veryfast key-int-max={keyint} ! h264parse")
            }
        }
    }

    /// GStreamer elements this codec needs at runtime.
    pub fn element_names(self) -> &'static [&'static str] {
        match self {
            Self::Mpeg4Part2 => &["avenc_mpeg4"],
            Self::Mjpeg => &["jpegenc"],
            Self::H264 => &["x264enc", "h264parse"],
        }
    }
}

/// Muxer element for a container extension.
pub fn muxer_for_extension(extension: &str) -> TenetResult<&'static str> {
    match extension
        .trim_start_matches('.')
        .to_ascii_lowercase()
        .as_str()
    {
        "avi" => Ok("avimux"),
        "mkv" => Ok("matroskamux"),
        "mp4" => Ok("mp4mux"),
        "mov" => Ok("qtmux"),
        other => Err(TenetError::config(format!(
            "Unsupported container extension {other:?} (expected avi, mkv, mp4 or mov)"
        ))),
    }
}

/// Check that a codec tag and container extension map onto known
/// GStreamer elements, so a bad setting fails before any capture starts.
pub fn validate_output_format(fourcc: &str, extension: &str) -> TenetResult<()> {
    VideoCodec::from_fourcc(fourcc)?;
    muxer_for_extension(extension)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Camera delivering packed RGB frames through an appsink.
pub struct GstCamera {
    index: u32,
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
    geometry: Geometry,
    open: bool,
}

impl GstCamera {
    /// Start the camera at `index` and wait up to `open_timeout` for its
    /// first frame. Every failure here is `DeviceUnavailable`.
    pub fn open(index: u32, open_timeout: Duration) -> TenetResult<Self> {
        init_gstreamer().map_err(|e| TenetError::device_unavailable(e.to_string()))?;

        let source = camera_source_fragment(index)?;
        let launch = format!(
            "{source} ! queue max-size-buffers=4 leaky=downstream ! videoconvert ! video/x-raw,format=RGB ! appsink name=sink max-buffers=2 drop=true sync=false"
        );
        let pipeline =
            launch_pipeline(&launch).map_err(|e| TenetError::device_unavailable(e.to_string()))?;
        let appsink = pipeline
            .by_name("sink")
            .and_then(|e| e.dynamic_cast::<gst_app::AppSink>().ok())
            .ok_or_else(|| TenetError::device_unavailable("Camera pipeline has no appsink"))?;

        if let Err(e) = pipeline.set_state(gst::State::Playing) {
            let detail = take_bus_error(&pipeline).unwrap_or_else(|| format!("{e:?}"));
            let _ = pipeline.set_state(gst::State::Null);
            return Err(TenetError::device_unavailable(format!(
                "Camera {index} failed to start: {detail}"
            )));
        }

        let mut camera = Self {
            index,
            pipeline,
            appsink,
            geometry: Geometry::new(0, 0),
            open: true,
        };

        // The first frame proves the device is delivering and fixes the geometry.
        match camera.pull(open_timeout) {
            Some(Ok(frame)) => camera.geometry = frame.geometry(),
            Some(Err(e)) => {
                camera.release();
                return Err(TenetError::device_unavailable(format!(
                    "Camera {index} delivered an unusable first frame: {e}"
                )));
            }
            None => {
                let detail = take_bus_error(&camera.pipeline)
                    .unwrap_or_else(|| format!("no frame within {open_timeout:?}"));
                camera.release();
                return Err(TenetError::device_unavailable(format!(
                    "Camera {index} did not deliver frames: {detail}"
                )));
            }
        }

        Ok(camera)
    }

    fn pull(&self, timeout: Duration) -> Option<TenetResult<Frame>> {
        let sample = self.appsink.try_pull_sample(clock_time(timeout))?;
        Some(sample_to_frame(&sample))
    }
}

impl VideoDevice for GstCamera {
    fn read_frame(&mut self) -> TenetResult<Frame> {
        if !self.open {
            return Err(TenetError::capture(format!(
                "Camera {} has been released",
                self.index
            )));
        }

        match self.pull(FRAME_READ_TIMEOUT) {
            Some(Ok(frame)) => {
                self.geometry = frame.geometry();
                Ok(frame)
            }
            Some(Err(e)) => Err(e),
            None => {
                if let Some(error) = take_bus_error(&self.pipeline) {
                    tracing::warn!(index = self.index, %error, "Camera pipeline reported an error");
                }
                if self.appsink.is_eos() {
                    // A drained appsink returns at once; keep the caller's loop from spinning.
                    std::thread::sleep(FRAME_READ_TIMEOUT);
                }
                Err(TenetError::frame_read(format!(
                    "No frame from camera {} within {FRAME_READ_TIMEOUT:?}",
                    self.index
                )))
            }
        }
    }

    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn release(&mut self) {
        if !self.open {
            return;
        }
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            tracing::warn!(index = self.index, error = ?e, "Failed to stop camera pipeline");
        }
        self.open = false;
        tracing::debug!(index = self.index, "Camera pipeline stopped");
    }

    fn is_open(&self) -> bool {
        // An unplugged camera drains to EOS and never produces again.
        self.open && !self.appsink.is_eos()
    }
}

impl Drop for GstCamera {
    fn drop(&mut self) {
        self.release();
    }
}

fn sample_to_frame(sample: &gst::Sample) -> TenetResult<Frame> {
    let caps = sample
        .caps()
        .ok_or_else(|| TenetError::frame_read("Camera sample carries no caps"))?;
    let info = gst_video::VideoInfo::from_caps(caps)
        .map_err(|e| TenetError::frame_read(format!("Unreadable camera caps: {e}")))?;
    let buffer = sample
        .buffer()
        .ok_or_else(|| TenetError::frame_read("Camera sample carries no buffer"))?;
    let map = buffer
        .map_readable()
        .map_err(|e| TenetError::frame_read(format!("Failed to map camera buffer: {e}")))?;

    let geometry = Geometry::new(info.width(), info.height());
    let stride = info.stride()[0].max(0) as usize;
    Frame::from_strided(geometry, stride, map.as_slice())
}

#[cfg(target_os = "linux")]
fn camera_source_fragment(index: u32) -> TenetResult<String> {
    let device = format!("/dev/video{index}");
    if !Path::new(&device).exists() {
        return Err(TenetError::device_unavailable(format!(
            "{device} does not exist (is a camera connected?)"
        )));
    }
    Ok(format!(
        "v4l2src device=\"{}\" do-timestamp=true",
        escape_path(Path::new(&device))
    ))
}

#[cfg(target_os = "macos")]
fn camera_source_fragment(index: u32) -> TenetResult<String> {
    Ok(format!("avfvideosrc device-index={index}"))
}

#[cfg(target_os = "windows")]
fn camera_source_fragment(index: u32) -> TenetResult<String> {
    Ok(format!("mfvideosrc device-index={index}"))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn camera_source_fragment(index: u32) -> TenetResult<String> {
    if index == 0 {
        Ok("autovideosrc".to_string())
    } else {
        Err(TenetError::device_unavailable(format!(
            "Only the default camera is supported on this platform (requested {index})"
        )))
    }
}

/// A video capture node found on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDeviceInfo {
    pub index: u32,
    pub path: String,
    pub name: String,
}

/// Enumerate `/dev/video0`..`/dev/video15`, with names from sysfs when
/// available.
pub fn detect_video_devices() -> Vec<VideoDeviceInfo> {
    (0..16u32)
        .filter_map(|index| {
            let path = format!("/dev/video{index}");
            if !Path::new(&path).exists() {
                return None;
            }
            let name = std::fs::read_to_string(format!("/sys/class/video4linux/video{index}/name"))
                .map(|name| name.trim().to_string())
                .unwrap_or_default();
            Some(VideoDeviceInfo { index, path, name })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Sequential file writer fed through an appsrc.
pub struct GstEncoder {
    path: PathBuf,
    pipeline: gst::Pipeline,
    appsrc: gst_app::AppSrc,
    stride: usize,
    fps: u32,
    frames_written: u64,
    finished: bool,
}

impl GstEncoder {
    pub fn create(path: &Path, settings: &EncoderSettings) -> TenetResult<Self> {
        init_gstreamer()?;

        let codec = VideoCodec::from_fourcc(&settings.fourcc)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let muxer = muxer_for_extension(extension)?;

        let info = rgb_video_info(settings.geometry, settings.fps)
            .map_err(|e| TenetError::encode(e.to_string()))?;
        let caps = info.to_caps().map_err(|e| {
            TenetError::encode(format!(
                "Failed to build caps for {}@{}: {e}",
                settings.geometry, settings.fps
            ))
        })?;

        let launch = format!(
            "appsrc name=src ! videoconvert ! {} ! {muxer} ! filesink location=\"{}\"",
            codec.encoder_fragment(settings.fps),
            escape_path(path)
        );
        let pipeline = launch_pipeline(&launch).map_err(|e| TenetError::encode(e.to_string()))?;
        let appsrc = pipeline
            .by_name("src")
            .and_then(|e| e.dynamic_cast::<gst_app::AppSrc>().ok())
            .ok_or_else(|| TenetError::encode("Encoder pipeline has no appsrc"))?;
        appsrc.set_caps(Some(&caps));
        appsrc.set_format(gst::Format::Time);
        appsrc.set_block(true);

        pipeline.set_state(gst::State::Playing).map_err(|e| {
            let detail = take_bus_error(&pipeline).unwrap_or_else(|| format!("{e:?}"));
            let _ = pipeline.set_state(gst::State::Null);
            TenetError::encode(format!(
                "Failed to start encoder for {}: {detail}",
                path.display()
            ))
        })?;

        tracing::debug!(
            path = %path.display(),
            ?codec,
            muxer,
            geometry = %settings.geometry,
            fps = settings.fps,
            "Encoder pipeline started"
        );

        Ok(Self {
            path: path.to_path_buf(),
            pipeline,
            appsrc,
            stride: info.stride()[0].max(0) as usize,
            fps: settings.fps.max(1),
            frames_written: 0,
            finished: false,
        })
    }
}

impl VideoEncoder for GstEncoder {
    fn write(&mut self, frame: &Frame) -> TenetResult<()> {
        if self.finished {
            return Err(TenetError::encode(format!(
                "Encoder for {} is already finished",
                self.path.display()
            )));
        }

        let pts_ns = frame_time_ns(self.frames_written, self.fps);
        let next_ns = frame_time_ns(self.frames_written + 1, self.fps);
        let mut buffer = gst::Buffer::from_mut_slice(frame.to_strided(self.stride));
        if let Some(buffer_ref) = buffer.get_mut() {
            buffer_ref.set_pts(gst::ClockTime::from_nseconds(pts_ns));
            buffer_ref.set_duration(gst::ClockTime::from_nseconds(next_ns - pts_ns));
        }

        self.appsrc.push_buffer(buffer).map_err(|e| {
            TenetError::encode(format!(
                "Failed to push frame {} to {}: {e:?}",
                self.frames_written,
                self.path.display()
            ))
        })?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> TenetResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        // EOS lets the muxer write its index; without it the file is truncated.
        let drained = match self.appsrc.end_of_stream() {
            Ok(_) => wait_for_eos(&self.pipeline, &self.path.display().to_string()),
            Err(e) => Err(TenetError::encode(format!(
                "Failed to signal end of stream for {}: {e:?}",
                self.path.display()
            ))),
        };
        let stopped = self.pipeline.set_state(gst::State::Null);

        drained?;
        stopped.map_err(|e| {
            TenetError::encode(format!(
                "Failed to stop encoder for {}: {e:?}",
                self.path.display()
            ))
        })?;

        tracing::info!(
            path = %self.path.display(),
            frames = self.frames_written,
            "Encoder finalized"
        );
        Ok(())
    }
}

impl Drop for GstEncoder {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.pipeline.set_state(gst::State::Null);
        }
    }
}

fn frame_time_ns(index: u64, fps: u32) -> u64 {
    index * 1_000_000_000 / fps.max(1) as u64
}

/// Poll the bus until EOS, an error, or the drain timeout.
fn wait_for_eos(pipeline: &gst::Pipeline, name: &str) -> TenetResult<()> {
    let Some(bus) = pipeline.bus() else {
        return Ok(());
    };

    let start = Instant::now();
    loop {
        let elapsed = start.elapsed();
        if elapsed >= EOS_DRAIN_TIMEOUT {
            tracing::warn!(pipeline = name, "EOS drain timed out; output may be truncated");
            return Ok(());
        }
        let remaining = clock_time(EOS_DRAIN_TIMEOUT - elapsed);
        match bus.timed_pop_filtered(
            remaining,
            &[gst::MessageType::Eos, gst::MessageType::Error],
        ) {
            Some(msg) => match msg.view() {
                gst::MessageView::Eos(_) => {
                    tracing::debug!(pipeline = name, "EOS received; pipeline drained");
                    return Ok(());
                }
                gst::MessageView::Error(e) => {
                    return Err(TenetError::encode(format!(
                        "{name}: pipeline error during EOS drain: {}",
                        e.error()
                    )));
                }
                _ => {}
            },
            None => {
                tracing::warn!(pipeline = name, "EOS drain timed out; output may be truncated");
                return Ok(());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

/// Window that displays pushed frames and latches key presses.
///
/// The pipeline is built on the first `show`, once the frame geometry is
/// known, and rebuilt if the geometry changes. If the window goes away
/// (closed by the user, no display) the preview disables itself instead of
/// failing the recording.
pub struct GstPreview {
    title: String,
    active: Option<ActivePreview>,
    pending_key: Arc<AtomicU32>,
    disabled: bool,
}

struct ActivePreview {
    pipeline: gst::Pipeline,
    appsrc: gst_app::AppSrc,
    overlay: gst::Element,
    geometry: Geometry,
    stride: usize,
}

impl ActivePreview {
    fn stop(self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

impl GstPreview {
    pub fn new(title: &str) -> TenetResult<Self> {
        init_gstreamer().map_err(|e| TenetError::preview(e.to_string()))?;
        Ok(Self {
            title: title.to_string(),
            active: None,
            pending_key: Arc::new(AtomicU32::new(0)),
            disabled: false,
        })
    }

    fn start(&self, geometry: Geometry) -> TenetResult<ActivePreview> {
        let info =
            rgb_video_info(geometry, 0).map_err(|e| TenetError::preview(e.to_string()))?;
        let caps = info
            .to_caps()
            .map_err(|e| TenetError::preview(format!("Failed to build preview caps: {e}")))?;

        let launch = "appsrc name=src is-live=true do-timestamp=true format=time ! videoconvert ! textoverlay name=caption silent=true halignment=left valignment=top font-desc=\"Sans Bold 16\" ! videoconvert name=display ! autovideosink sync=false";
        let pipeline = launch_pipeline(launch).map_err(|e| TenetError::preview(e.to_string()))?;
        let appsrc = pipeline
            .by_name("src")
            .and_then(|e| e.dynamic_cast::<gst_app::AppSrc>().ok())
            .ok_or_else(|| TenetError::preview("Preview pipeline has no appsrc"))?;
        let overlay = pipeline
            .by_name("caption")
            .ok_or_else(|| TenetError::preview("Preview pipeline has no textoverlay"))?;
        appsrc.set_caps(Some(&caps));

        if let Some(display) = pipeline.by_name("display") {
            install_key_probe(&display, Arc::clone(&self.pending_key));
        }

        pipeline.set_state(gst::State::Playing).map_err(|e| {
            let detail = take_bus_error(&pipeline).unwrap_or_else(|| format!("{e:?}"));
            let _ = pipeline.set_state(gst::State::Null);
            TenetError::preview(format!("Failed to open preview {:?}: {detail}", self.title))
        })?;

        // Video sinks title their window after the stream's title tag.
        let mut tags = gst::TagList::new();
        if let Some(tags) = tags.get_mut() {
            tags.add::<gst::tags::Title>(&self.title.as_str(), gst::TagMergeMode::Replace);
        }
        if !appsrc.send_event(gst::event::Tag::new(tags)) {
            tracing::debug!(title = %self.title, "Preview sink ignored title tag");
        }

        tracing::debug!(title = %self.title, %geometry, "Preview window opened");
        Ok(ActivePreview {
            pipeline,
            appsrc,
            overlay,
            geometry,
            stride: info.stride()[0].max(0) as usize,
        })
    }

    fn disable(&mut self) {
        self.disabled = true;
        if let Some(active) = self.active.take() {
            active.stop();
        }
    }
}

impl PreviewSurface for GstPreview {
    fn show(&mut self, frame: &Frame, caption: Option<&Caption>) -> TenetResult<()> {
        if self.disabled {
            return Ok(());
        }

        let geometry = frame.geometry();
        if self.active.as_ref().map(|a| a.geometry) != Some(geometry) {
            if let Some(old) = self.active.take() {
                old.stop();
            }
            match self.start(geometry) {
                Ok(active) => self.active = Some(active),
                Err(e) => {
                    tracing::warn!(
                        title = %self.title,
                        error = %e,
                        "Preview window could not be opened; disabling preview"
                    );
                    self.disable();
                    return Ok(());
                }
            }
        }
        let Some(active) = self.active.as_ref() else {
            return Ok(());
        };

        apply_caption(&active.overlay, caption);

        let buffer = gst::Buffer::from_mut_slice(frame.to_strided(active.stride));
        if let Err(e) = active.appsrc.push_buffer(buffer) {
            tracing::warn!(title = %self.title, error = ?e, "Preview window is gone; disabling preview");
            self.disable();
        }
        Ok(())
    }

    fn poll_key(&mut self, wait: Duration) -> Option<char> {
        match self.active.as_ref().and_then(|a| a.pipeline.bus()) {
            Some(bus) => {
                if let Some(msg) = bus.timed_pop_filtered(clock_time(wait), &[gst::MessageType::Error])
                {
                    if let gst::MessageView::Error(err) = msg.view() {
                        tracing::warn!(
                            title = %self.title,
                            error = %err.error(),
                            "Preview window failed; disabling preview"
                        );
                    }
                    self.disable();
                }
            }
            None => std::thread::sleep(wait),
        }

        char::from_u32(self.pending_key.swap(0, Ordering::SeqCst)).filter(|c| *c != '\0')
    }

    fn close(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop();
            tracing::debug!(title = %self.title, "Preview window closed");
        }
    }
}

impl Drop for GstPreview {
    fn drop(&mut self) {
        self.close();
    }
}

fn apply_caption(overlay: &gst::Element, caption: Option<&Caption>) {
    match caption {
        Some(caption) => {
            let [r, g, b] = caption.color;
            let argb = 0xff00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32;
            overlay.set_property("text", caption.text.as_str());
            overlay.set_property("xpad", caption.origin.0.max(0));
            overlay.set_property("ypad", (caption.origin.1 - CAPTION_ASCENT_PX).max(0));
            overlay.set_property("color", argb);
            overlay.set_property("silent", false);
        }
        None => overlay.set_property("silent", true),
    }
}

/// Latch single-character key presses the video sink sends upstream.
fn install_key_probe(element: &gst::Element, slot: Arc<AtomicU32>) {
    let Some(pad) = element.static_pad("src") else {
        tracing::warn!("Preview has no src pad; keyboard control unavailable");
        return;
    };
    let probe = pad.add_probe(gst::PadProbeType::EVENT_UPSTREAM, move |_pad, info| {
        if let Some(gst::PadProbeData::Event(ref event)) = info.data {
            if let Ok(gst_video::NavigationEvent::KeyPress { key, .. }) =
                gst_video::NavigationEvent::parse(event)
            {
                let mut chars = key.chars();
                if let (Some(c), None) = (chars.next(), chars.next()) {
                    slot.store(c as u32, Ordering::SeqCst);
                }
            }
        }
        gst::PadProbeReturn::Ok
    });
    if probe.is_none() {
        tracing::warn!("Failed to install key probe; keyboard control unavailable");
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn rgb_video_info(geometry: Geometry, fps: u32) -> TenetResult<gst_video::VideoInfo> {
    gst_video::VideoInfo::builder(gst_video::VideoFormat::Rgb, geometry.width, geometry.height)
        .fps(gst::Fraction::new(fps as i32, 1))
        .build()
        .map_err(|e| TenetError::capture(format!("Invalid RGB format {geometry}@{fps}: {e}")))
}

fn launch_pipeline(launch: &str) -> TenetResult<gst::Pipeline> {
    let element = gst::parse::launch(launch)
        .map_err(|e| TenetError::capture(format!("Failed to build pipeline: {e}")))?;
    element
        .dynamic_cast::<gst::Pipeline>()
        .map_err(|_| TenetError::capture("Launch string did not produce a pipeline"))
}

/// Pop a pending error message off the bus, if any.
fn take_bus_error(pipeline: &gst::Pipeline) -> Option<String> {
    let msg = pipeline.bus()?.pop_filtered(&[gst::MessageType::Error])?;
    match msg.view() {
        gst::MessageView::Error(err) => Some(match err.debug() {
            Some(debug) => format!("{} ({debug})", err.error()),
            None => err.error().to_string(),
        }),
        _ => None,
    }
}

fn clock_time(duration: Duration) -> gst::ClockTime {
    gst::ClockTime::from_nseconds(duration.as_nanos() as u64)
}

pub(crate) fn init_gstreamer() -> TenetResult<()> {
    static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
    match init_res {
        Ok(()) => Ok(()),
        Err(e) => Err(TenetError::capture(format!(
            "Failed to initialize GStreamer: {e}"
        ))),
    }
}

/// Whether an element factory is registered.
pub(crate) fn element_available(name: &str) -> bool {
    init_gstreamer().is_ok() && gst::ElementFactory::find(name).is_some()
}

fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_mapping() {
        assert_eq!(VideoCodec::from_fourcc("XVID").unwrap(), VideoCodec::Mpeg4Part2);
        assert_eq!(VideoCodec::from_fourcc("xvid").unwrap(), VideoCodec::Mpeg4Part2);
        assert_eq!(VideoCodec::from_fourcc("MJPG").unwrap(), VideoCodec::Mjpeg);
        assert_eq!(VideoCodec::from_fourcc("avc1").unwrap(), VideoCodec::H264);

        let err = VideoCodec::from_fourcc("VP80").unwrap_err();
        assert!(err.to_string().contains("VP80"));
    }

    #[test]
    fn test_muxer_mapping() {
        assert_eq!(muxer_for_extension("avi").unwrap(), "avimux");
        assert_eq!(muxer_for_extension(".MKV").unwrap(), "matroskamux");
        assert!(muxer_for_extension("gif").is_err());
    }

    #[test]
    fn test_validate_output_format() {
        assert!(validate_output_format("XVID", "avi").is_ok());
        assert!(validate_output_format("mjpg", ".mkv").is_ok());

        let err = validate_output_format("VP80", "avi").unwrap_err();
        assert!(matches!(err, TenetError::Config { .. }));
        let err = validate_output_format("XVID", "gif").unwrap_err();
        assert!(err.to_string().contains("gif"));
    }

    #[test]
    fn test_h264_fragment_sets_keyframe_interval() {
        assert_eq!(
            VideoCodec::H264.encoder_fragment(30),
            "x264enc speed-preset=veryfast key-int-max=60 ! h264parse"
        );
    }

    #[test]
    fn test_frame_times_at_thirty_fps() {
        assert_eq!(frame_time_ns(0, 30), 0);
        assert_eq!(frame_time_ns(1, 30), 33_333_333);
        assert_eq!(frame_time_ns(30, 30), 1_000_000_000);
    }

    #[test]
    fn test_escape_path_quotes() {
        assert_eq!(
            escape_path(Path::new("out/\"odd\".avi")),
            "out/\\\"odd\\\".avi"
        );
    }
}

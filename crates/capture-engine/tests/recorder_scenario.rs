use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use tenet_capture_engine::output::parse_artifact_name;
use tenet_capture_engine::synthetic::{create_sweep_pattern, decode_sweep_index};
use tenet_capture_engine::{
    ArtifactKind, Caption, CaptureBackend, EncoderSettings, Frame, Geometry, PreviewSurface,
    RecorderConfig, RunOutcome, TenetRecorder, VideoDevice, VideoEncoder, CAPTURE_WINDOW_TITLE,
    PLAYBACK_WINDOW_TITLE,
};
use tenet_common::error::{TenetError, TenetResult};

fn geometry() -> Geometry {
    Geometry::new(64, 48)
}

#[derive(Debug, Clone, Copy)]
enum Read {
    Frame,
    Skip,
    Fatal,
}

/// What the fake hardware will do, and what the recorder did to it.
#[derive(Default)]
struct Rig {
    reads: VecDeque<Read>,
    read_interval: Duration,
    cancel_after_shows: Option<usize>,
    fail_device_open: bool,
    fail_encoder_open: bool,
    fail_write_at: Option<usize>,
    fail_preview_open: bool,
    fail_preview_show: bool,
    fail_finish_of: Option<usize>,
    closed_after_frames: Option<u64>,

    device_opens: usize,
    releases: usize,
    previews_opened: Vec<String>,
    previews_closed: Vec<String>,
    shown: Vec<(String, Frame, Option<Caption>)>,
    encoders: Vec<(PathBuf, EncoderSettings)>,
    written: Vec<Vec<Frame>>,
    finished: Vec<PathBuf>,
}

impl Rig {
    fn with_frames(count: usize) -> Self {
        Self {
            reads: std::iter::repeat(Read::Frame).take(count).collect(),
            ..Self::default()
        }
    }

    fn shown_in(&self, title: &str) -> Vec<&Frame> {
        self.shown
            .iter()
            .filter(|(t, _, _)| t == title)
            .map(|(_, frame, _)| frame)
            .collect()
    }
}

type Shared = Rc<RefCell<Rig>>;

struct FakeBackend {
    rig: Shared,
}

struct FakeDevice {
    rig: Shared,
    next_index: u64,
}

struct FakePreview {
    rig: Shared,
    title: String,
    shows: usize,
}

struct FakeEncoder {
    rig: Shared,
    slot: usize,
    path: PathBuf,
    writes: usize,
}

impl CaptureBackend for FakeBackend {
    fn open_device(&self, _index: u32) -> TenetResult<Box<dyn VideoDevice>> {
        let mut rig = self.rig.borrow_mut();
        if rig.fail_device_open {
            return Err(TenetError::capture("camera busy"));
        }
        rig.device_opens += 1;
        Ok(Box::new(FakeDevice {
            rig: Rc::clone(&self.rig),
            next_index: 0,
        }))
    }

    fn open_preview(&self, title: &str) -> TenetResult<Box<dyn PreviewSurface>> {
        let mut rig = self.rig.borrow_mut();
        if rig.fail_preview_open {
            return Err(TenetError::preview("no display"));
        }
        rig.previews_opened.push(title.to_string());
        Ok(Box::new(FakePreview {
            rig: Rc::clone(&self.rig),
            title: title.to_string(),
            shows: 0,
        }))
    }

    fn open_encoder(
        &self,
        path: &Path,
        settings: &EncoderSettings,
    ) -> TenetResult<Box<dyn VideoEncoder>> {
        let mut rig = self.rig.borrow_mut();
        if rig.fail_encoder_open {
            return Err(TenetError::encode("no space left on device"));
        }
        std::fs::File::create(path)?;
        rig.encoders.push((path.to_path_buf(), settings.clone()));
        rig.written.push(Vec::new());
        Ok(Box::new(FakeEncoder {
            rig: Rc::clone(&self.rig),
            slot: rig.written.len() - 1,
            path: path.to_path_buf(),
            writes: 0,
        }))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

impl VideoDevice for FakeDevice {
    fn read_frame(&mut self) -> TenetResult<Frame> {
        let (step, interval) = {
            let mut rig = self.rig.borrow_mut();
            (rig.reads.pop_front(), rig.read_interval)
        };
        std::thread::sleep(interval);
        match step {
            Some(Read::Frame) => {
                let frame = Frame::from_image(create_sweep_pattern(geometry(), self.next_index));
                self.next_index += 1;
                Ok(frame)
            }
            Some(Read::Skip) | None => {
                if step.is_none() {
                    std::thread::sleep(Duration::from_millis(1));
                }
                Err(TenetError::frame_read("no frame ready"))
            }
            Some(Read::Fatal) => Err(TenetError::capture("device unplugged")),
        }
    }

    fn geometry(&self) -> Geometry {
        geometry()
    }

    fn release(&mut self) {
        self.rig.borrow_mut().releases += 1;
    }

    fn is_open(&self) -> bool {
        match self.rig.borrow().closed_after_frames {
            Some(limit) => self.next_index < limit,
            None => true,
        }
    }
}

impl PreviewSurface for FakePreview {
    fn show(&mut self, frame: &Frame, caption: Option<&Caption>) -> TenetResult<()> {
        self.shows += 1;
        let mut rig = self.rig.borrow_mut();
        if rig.fail_preview_show {
            return Err(TenetError::preview("window vanished"));
        }
        rig.shown.push((self.title.clone(), frame.clone(), caption.cloned()));
        Ok(())
    }

    fn poll_key(&mut self, _wait: Duration) -> Option<char> {
        match self.rig.borrow().cancel_after_shows {
            Some(limit) if self.title == CAPTURE_WINDOW_TITLE && self.shows >= limit => Some('Q'),
            _ => None,
        }
    }

    fn close(&mut self) {
        self.rig.borrow_mut().previews_closed.push(self.title.clone());
    }
}

impl VideoEncoder for FakeEncoder {
    fn write(&mut self, frame: &Frame) -> TenetResult<()> {
        let index = self.writes;
        self.writes += 1;
        let mut rig = self.rig.borrow_mut();
        if rig.fail_write_at == Some(index) {
            return Err(TenetError::encode(format!("write {index} rejected")));
        }
        rig.written[self.slot].push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> TenetResult<()> {
        let mut rig = self.rig.borrow_mut();
        if rig.fail_finish_of == Some(self.slot) {
            return Err(TenetError::encode("muxer refused end of stream"));
        }
        rig.finished.push(self.path.clone());
        Ok(())
    }
}

fn temp_output_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "tenet_test_recorder_{name}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn recorder_config(output_dir: &Path, duration: Duration) -> RecorderConfig {
    RecorderConfig {
        output_dir: output_dir.to_path_buf(),
        duration,
        poll_interval: Duration::ZERO,
        playback_interval: Duration::ZERO,
        ..RecorderConfig::default()
    }
}

fn start(rig: &Shared, output_dir: &Path, duration: Duration) -> TenetRecorder {
    TenetRecorder::initialize(
        recorder_config(output_dir, duration),
        Box::new(FakeBackend {
            rig: Rc::clone(rig),
        }),
    )
    .expect("fake device should open")
}

fn indices(frames: &[Frame]) -> Vec<u64> {
    frames
        .iter()
        .map(|frame| decode_sweep_index(frame).expect("frame should carry its index"))
        .collect()
}

#[test]
fn one_second_session_writes_thirty_frames_forward_and_reversed() {
    let dir = temp_output_dir("thirty");
    let rig: Shared = Rc::new(RefCell::new(Rig {
        read_interval: Duration::from_millis(20),
        ..Rig::with_frames(30)
    }));

    let mut recorder = start(&rig, &dir, Duration::from_secs(1));
    let outcome = recorder.run();

    let RunOutcome::Exported { summary, pair } = outcome else {
        panic!("expected an export, got {outcome:?}");
    };
    assert_eq!(summary.frames_captured, 30);
    assert!(!summary.cancelled);
    assert!(summary.elapsed >= Duration::from_secs(1));
    assert_eq!(pair.frames_written, 30);
    assert_eq!(pair.write_failures, 0);

    let rig = rig.borrow();
    assert_eq!(rig.encoders.len(), 2);
    assert_eq!(rig.encoders[0].0, pair.original);
    assert_eq!(rig.encoders[1].0, pair.inverted);

    let forward = indices(&rig.written[0]);
    let reversed = indices(&rig.written[1]);
    assert_eq!(forward, (0..30).collect::<Vec<_>>());
    assert_eq!(reversed, (0..30).rev().collect::<Vec<_>>());

    let mut mirrored = rig.written[0].clone();
    mirrored.reverse();
    assert_eq!(rig.written[1], mirrored);
    assert_eq!(rig.finished, vec![pair.original.clone(), pair.inverted.clone()]);

    assert!(pair.original.starts_with(&dir));
    assert!(pair.inverted.starts_with(&dir));
    assert!(pair.original.exists());
    assert!(pair.inverted.exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn artifact_names_share_one_stamp() {
    let dir = temp_output_dir("stamp");
    let rig: Shared = Rc::new(RefCell::new(Rig::with_frames(3)));

    let mut recorder = start(&rig, &dir, Duration::from_millis(100));
    let outcome = recorder.run();
    let pair = outcome.pair().expect("three frames should export");

    let name_of = |path: &Path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .expect("artifact should have a UTF-8 file name")
    };
    let (original_kind, original_stamp) =
        parse_artifact_name(&name_of(&pair.original)).expect("original name should parse");
    let (inverted_kind, inverted_stamp) =
        parse_artifact_name(&name_of(&pair.inverted)).expect("inverted name should parse");

    assert_eq!(original_kind, ArtifactKind::Original);
    assert_eq!(inverted_kind, ArtifactKind::Inverted);
    assert_eq!(original_stamp, inverted_stamp);
    assert_eq!(original_stamp, pair.stamp);
    assert_eq!(
        name_of(&pair.original).replacen("original", "inverted", 1),
        name_of(&pair.inverted)
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn zero_duration_writes_nothing_and_opens_no_windows() {
    let dir = temp_output_dir("zero");
    let rig: Shared = Rc::new(RefCell::new(Rig::with_frames(10)));

    let mut recorder = start(&rig, &dir, Duration::ZERO);
    let outcome = recorder.run();

    let RunOutcome::EmptySession { summary } = outcome else {
        panic!("expected an empty session, got {outcome:?}");
    };
    assert_eq!(summary.frames_captured, 0);

    let rig = rig.borrow();
    assert!(rig.encoders.is_empty());
    assert!(rig.previews_opened.is_empty());
    assert_eq!(rig.releases, 1);

    assert!(dir.is_dir());
    let entries = std::fs::read_dir(&dir)
        .expect("output dir should be readable")
        .count();
    assert_eq!(entries, 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn device_yielding_nothing_is_an_empty_session() {
    let dir = temp_output_dir("silent");
    let rig: Shared = Rc::new(RefCell::new(Rig::default()));

    let mut recorder = start(&rig, &dir, Duration::from_millis(50));
    let outcome = recorder.run();

    let RunOutcome::EmptySession { summary } = outcome else {
        panic!("expected an empty session, got {outcome:?}");
    };
    assert!(summary.frames_skipped > 0);
    assert!(rig.borrow().encoders.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn marker_only_appears_in_the_capture_preview() {
    let dir = temp_output_dir("marker");
    let rig: Shared = Rc::new(RefCell::new(Rig::with_frames(5)));

    let mut recorder = start(&rig, &dir, Duration::from_millis(100));
    let outcome = recorder.run();
    assert!(outcome.pair().is_some());

    let rig = rig.borrow();
    for frames in &rig.written {
        for frame in frames {
            let index = decode_sweep_index(frame).expect("frame should carry its index");
            assert_eq!(
                frame,
                &Frame::from_image(create_sweep_pattern(geometry(), index)),
                "written frame {index} differs from what the device produced"
            );
            assert_ne!(frame.pixel(30, 30), Some([255, 0, 0]));
        }
    }

    let live = rig.shown_in(CAPTURE_WINDOW_TITLE);
    assert_eq!(live.len(), 5);
    for frame in live {
        assert_eq!(frame.pixel(30, 30), Some([255, 0, 0]));
    }
    for (title, _, caption) in &rig.shown {
        if title == CAPTURE_WINDOW_TITLE {
            let caption = caption.as_ref().expect("capture preview should be captioned");
            assert_eq!(caption.text, "RECORDING");
            assert_eq!(caption.origin, (50, 40));
        } else {
            assert!(caption.is_none());
        }
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn playback_preview_shows_frames_in_reverse() {
    let dir = temp_output_dir("playback");
    let rig: Shared = Rc::new(RefCell::new(Rig::with_frames(4)));

    let mut recorder = start(&rig, &dir, Duration::from_millis(100));
    assert!(recorder.run().pair().is_some());

    let rig = rig.borrow();
    let played: Vec<u64> = rig
        .shown_in(PLAYBACK_WINDOW_TITLE)
        .into_iter()
        .map(|frame| decode_sweep_index(frame).expect("frame should carry its index"))
        .collect();
    assert_eq!(played, vec![3, 2, 1, 0]);
    assert_eq!(
        rig.previews_opened,
        vec![CAPTURE_WINDOW_TITLE.to_string(), PLAYBACK_WINDOW_TITLE.to_string()]
    );
    assert_eq!(rig.previews_closed, rig.previews_opened);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn encoders_use_device_geometry_and_configured_format() {
    let dir = temp_output_dir("geometry");
    let rig: Shared = Rc::new(RefCell::new(Rig::with_frames(2)));

    let mut recorder = start(&rig, &dir, Duration::from_millis(50));
    let pair = recorder.run().pair().cloned().expect("two frames should export");
    assert_eq!(pair.geometry, geometry());

    let rig = rig.borrow();
    for (path, settings) in &rig.encoders {
        assert_eq!(settings.geometry, geometry());
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.fourcc, "XVID");
        assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("avi"));
    }
    for frames in &rig.written {
        assert!(frames.iter().all(|frame| frame.geometry() == geometry()));
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn cancel_key_stops_capture_early() {
    let dir = temp_output_dir("cancel");
    let rig: Shared = Rc::new(RefCell::new(Rig {
        cancel_after_shows: Some(3),
        ..Rig::with_frames(100)
    }));

    let mut recorder = start(&rig, &dir, Duration::from_secs(30));
    let outcome = recorder.run();

    let RunOutcome::Exported { summary, pair } = outcome else {
        panic!("expected an export, got {outcome:?}");
    };
    assert!(summary.cancelled);
    assert_eq!(summary.frames_captured, 3);
    assert!(summary.elapsed < Duration::from_secs(30));
    assert_eq!(pair.frames_written, 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failed_reads_are_skipped_without_buffering() {
    let dir = temp_output_dir("skips");
    let rig: Shared = Rc::new(RefCell::new(Rig {
        reads: [Read::Frame, Read::Skip, Read::Frame, Read::Skip, Read::Skip, Read::Frame]
            .into_iter()
            .collect(),
        ..Rig::default()
    }));

    let mut recorder = start(&rig, &dir, Duration::from_millis(100));
    let summary = recorder
        .record(Duration::from_millis(100))
        .expect("skipped reads should not fail the recording");

    assert_eq!(summary.frames_captured, 3);
    assert!(summary.frames_skipped >= 3);
    let buffered: Vec<Frame> = recorder.frames().iter().cloned().collect();
    assert_eq!(indices(&buffered), vec![0, 1, 2]);

    recorder.teardown();
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn write_failures_are_counted_and_export_continues() {
    let dir = temp_output_dir("write_failure");
    let rig: Shared = Rc::new(RefCell::new(Rig {
        fail_write_at: Some(1),
        ..Rig::with_frames(4)
    }));

    let mut recorder = start(&rig, &dir, Duration::from_millis(100));
    let pair = recorder.run().pair().cloned().expect("export should survive write failures");

    assert_eq!(pair.write_failures, 2);
    let rig = rig.borrow();
    assert_eq!(indices(&rig.written[0]), vec![0, 2, 3]);
    assert_eq!(indices(&rig.written[1]), vec![3, 1, 0]);
    assert_eq!(rig.finished.len(), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn device_failure_mid_record_releases_once() {
    let dir = temp_output_dir("fatal_read");
    let rig: Shared = Rc::new(RefCell::new(Rig {
        reads: [Read::Frame, Read::Frame, Read::Fatal].into_iter().collect(),
        ..Rig::default()
    }));

    let mut recorder = start(&rig, &dir, Duration::from_secs(5));
    let outcome = recorder.run();

    match &outcome {
        RunOutcome::Failed(message) => assert!(message.contains("device unplugged")),
        other => panic!("expected a failure, got {other:?}"),
    }
    assert!(recorder.is_released());
    drop(recorder);

    let rig = rig.borrow();
    assert_eq!(rig.releases, 1);
    assert!(rig.encoders.is_empty());
    assert_eq!(rig.previews_closed, vec![CAPTURE_WINDOW_TITLE.to_string()]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn encoder_failure_during_export_releases_once() {
    let dir = temp_output_dir("encoder_failure");
    let rig: Shared = Rc::new(RefCell::new(Rig {
        fail_encoder_open: true,
        ..Rig::with_frames(3)
    }));

    let mut recorder = start(&rig, &dir, Duration::from_millis(100));
    let outcome = recorder.run();

    assert!(outcome.is_failed());
    drop(recorder);
    assert_eq!(rig.borrow().releases, 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_display_still_exports_both_files() {
    let dir = temp_output_dir("no_display");
    let rig: Shared = Rc::new(RefCell::new(Rig {
        fail_preview_open: true,
        ..Rig::with_frames(5)
    }));

    let mut recorder = start(&rig, &dir, Duration::from_millis(100));
    let outcome = recorder.run();

    let pair = outcome.pair().cloned().expect("export should not need a window");
    assert_eq!(pair.frames_written, 5);
    assert!(pair.original.exists());
    assert!(pair.inverted.exists());

    let rig = rig.borrow();
    assert!(rig.previews_opened.is_empty());
    assert!(rig.shown.is_empty());
    assert_eq!(indices(&rig.written[0]), vec![0, 1, 2, 3, 4]);
    assert_eq!(indices(&rig.written[1]), vec![4, 3, 2, 1, 0]);
    assert_eq!(rig.finished.len(), 2);
    assert_eq!(rig.releases, 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn broken_preview_window_is_dropped_and_recording_continues() {
    let dir = temp_output_dir("broken_window");
    let rig: Shared = Rc::new(RefCell::new(Rig {
        fail_preview_show: true,
        ..Rig::with_frames(4)
    }));

    let mut recorder = start(&rig, &dir, Duration::from_millis(100));
    let outcome = recorder.run();

    let pair = outcome.pair().cloned().expect("export should survive a broken window");
    assert_eq!(pair.frames_written, 4);

    let rig = rig.borrow();
    assert_eq!(
        rig.previews_opened,
        vec![CAPTURE_WINDOW_TITLE.to_string(), PLAYBACK_WINDOW_TITLE.to_string()]
    );
    assert_eq!(
        rig.previews_closed,
        vec![CAPTURE_WINDOW_TITLE.to_string(), PLAYBACK_WINDOW_TITLE.to_string()]
    );
    assert_eq!(indices(&rig.written[1]), vec![3, 2, 1, 0]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failure_after_playback_opens_closes_each_window_once() {
    let dir = temp_output_dir("finish_failure");
    let rig: Shared = Rc::new(RefCell::new(Rig {
        fail_finish_of: Some(1),
        ..Rig::with_frames(3)
    }));

    let mut recorder = start(&rig, &dir, Duration::from_millis(100));
    let outcome = recorder.run();

    match &outcome {
        RunOutcome::Failed(message) => assert!(message.contains("muxer refused end of stream")),
        other => panic!("expected a failure, got {other:?}"),
    }
    recorder.teardown();
    drop(recorder);

    let rig = rig.borrow();
    assert_eq!(rig.shown_in(PLAYBACK_WINDOW_TITLE).len(), 3);
    let playback_closes = rig
        .previews_closed
        .iter()
        .filter(|title| *title == PLAYBACK_WINDOW_TITLE)
        .count();
    assert_eq!(playback_closes, 1);
    assert_eq!(rig.finished.len(), 1);
    assert_eq!(rig.releases, 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn device_closing_mid_record_fails_and_releases_once() {
    let dir = temp_output_dir("device_closed");
    let rig: Shared = Rc::new(RefCell::new(Rig {
        closed_after_frames: Some(2),
        ..Rig::with_frames(10)
    }));

    let mut recorder = start(&rig, &dir, Duration::from_secs(5));
    let outcome = recorder.run();

    match &outcome {
        RunOutcome::Failed(message) => assert!(message.contains("closed")),
        other => panic!("expected a failure, got {other:?}"),
    }
    drop(recorder);

    let rig = rig.borrow();
    assert_eq!(rig.shown_in(CAPTURE_WINDOW_TITLE).len(), 2);
    assert!(rig.encoders.is_empty());
    assert_eq!(rig.releases, 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn teardown_is_idempotent() {
    let dir = temp_output_dir("teardown");
    let rig: Shared = Rc::new(RefCell::new(Rig::with_frames(1)));

    let mut recorder = start(&rig, &dir, Duration::from_millis(10));
    recorder.teardown();
    recorder.teardown();
    assert!(recorder.is_released());
    drop(recorder);

    assert_eq!(rig.borrow().device_opens, 1);
    assert_eq!(rig.borrow().releases, 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unopenable_device_is_reported_as_unavailable() {
    let dir = temp_output_dir("unavailable");
    let rig: Shared = Rc::new(RefCell::new(Rig {
        fail_device_open: true,
        ..Rig::default()
    }));

    let result = TenetRecorder::initialize(
        recorder_config(&dir, Duration::from_secs(1)),
        Box::new(FakeBackend {
            rig: Rc::clone(&rig),
        }),
    );

    match result {
        Err(TenetError::DeviceUnavailable { message }) => assert!(message.contains("camera busy")),
        Err(other) => panic!("expected DeviceUnavailable, got {other}"),
        Ok(_) => panic!("device open should have failed"),
    }
    assert!(!dir.exists());
}

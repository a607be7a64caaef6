//! Tenet Capture Engine
//!
//! Records a fixed-length clip from a camera with a live, marked preview,
//! then writes the clip twice: once as captured and once in reverse.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                TenetRecorder                  │
//! │  ┌─────────────┐  frames  ┌───────────────┐   │
//! │  │ VideoDevice │ ───────► │  FrameBuffer  │   │
//! │  └──────┬──────┘          └───────┬───────┘   │
//! │         │ marked copy             │           │
//! │         ▼                  forward│ reversed  │
//! │  ┌──────────────┐         ┌───────┴───────┐   │
//! │  │ Capture      │         │ VideoEncoder  │   │
//! │  │ Preview      │         │   x2          │──►│ Playback Preview
//! │  └──────────────┘         └───────┬───────┘   │
//! │                                   ▼           │
//! │   original_<stamp>.avi   inverted_<stamp>.avi │
//! └──────────────────────────────────────────────┘
//! ```

pub mod annotate;
pub mod backend;
pub mod capabilities;
pub mod frame;
pub mod output;
pub mod pipeline;
pub mod recorder;
pub mod synthetic;

pub use annotate::{Caption, RecordingIndicator};
pub use backend::{
    get_backend, CameraBackend, CaptureBackend, DeviceSource, EncoderSettings, NullPreview,
    PreviewSurface, VideoDevice, VideoEncoder,
};
pub use frame::{Frame, FrameBuffer, Geometry};
pub use output::{ArtifactKind, ArtifactPaths};
pub use recorder::*;

//! Error types shared across Tenet crates.

/// Top-level error type for Tenet operations.
#[derive(Debug, thiserror::Error)]
pub enum TenetError {
    #[error("Video device unavailable: {message}")]
    DeviceUnavailable { message: String },

    #[error("Frame read failed: {message}")]
    FrameRead { message: String },

    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("Preview error: {message}")]
    Preview { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using TenetError.
pub type TenetResult<T> = Result<T, TenetError>;

impl TenetError {
    pub fn device_unavailable(msg: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            message: msg.into(),
        }
    }

    pub fn frame_read(msg: impl Into<String>) -> Self {
        Self::FrameRead {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn preview(msg: impl Into<String>) -> Self {
        Self::Preview {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error only costs a single frame and the capture loop
    /// should keep going.
    pub fn is_frame_skip(&self) -> bool {
        matches!(self, Self::FrameRead { .. })
    }
}

//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{TenetError, TenetResult};

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where recordings are written.
    pub output_dir: PathBuf,

    /// Recording parameters.
    pub recording: RecordingDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Recording parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingDefaults {
    /// Capture length in seconds.
    pub duration_secs: f64,

    /// Frame rate written into both output files.
    pub fps: u32,

    /// Four-character codec tag of the output files.
    pub fourcc: String,

    /// Container extension of the output files (without the dot).
    pub container_extension: String,

    /// Zero-based index of the capture device.
    pub device_index: u32,

    /// Seconds to wait between the banner and the start of capture.
    pub countdown_secs: u64,

    /// Key poll interval during capture (ms).
    pub poll_interval_ms: u64,

    /// Per-frame delay of the inverted playback preview (ms).
    pub playback_interval_ms: u64,

    /// Whether to open preview windows.
    pub preview: bool,

    /// How long to wait for the first frame when opening the device (ms).
    pub device_open_timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "tenet=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("tenet_recordings"),
            recording: RecordingDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RecordingDefaults {
    fn default() -> Self {
        Self {
            duration_secs: 10.0,
            fps: 30,
            fourcc: "XVID".to_string(),
            container_extension: "avi".to_string(),
            device_index: 0,
            countdown_secs: 3,
            poll_interval_ms: 1,
            playback_interval_ms: 33,
            preview: true,
            device_open_timeout_ms: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl RecordingDefaults {
    /// Capture length. Negative or non-finite values collapse to zero.
    pub fn duration(&self) -> Duration {
        if self.duration_secs.is_nan() || self.duration_secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.duration_secs).unwrap_or(Duration::MAX)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_interval_ms)
    }

    pub fn device_open_timeout(&self) -> Duration {
        Duration::from_millis(self.device_open_timeout_ms)
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Reject settings the encoder pipelines cannot honour.
    pub fn validate(&self) -> TenetResult<()> {
        let rec = &self.recording;
        let representable = rec.duration_secs <= 0.0
            || Duration::try_from_secs_f64(rec.duration_secs).is_ok();
        if !rec.duration_secs.is_finite() || !representable {
            return Err(TenetError::config(format!(
                "duration_secs must be a finite number of seconds, got {}",
                rec.duration_secs
            )));
        }
        if rec.fps == 0 {
            return Err(TenetError::config("fps must be greater than zero"));
        }
        if rec.fourcc.len() != 4 || !rec.fourcc.chars().all(|c| c.is_ascii_graphic()) {
            return Err(TenetError::config(format!(
                "fourcc must be four printable ASCII characters, got {:?}",
                rec.fourcc
            )));
        }
        let ext = rec.container_extension.trim_start_matches('.');
        if ext.is_empty() {
            return Err(TenetError::config("container extension must not be empty"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(TenetError::config("output directory must not be empty"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("tenet").join("config.json")
}

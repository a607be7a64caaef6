//! Clock and timing utilities for a recording session.
//!
//! A session is bounded by wall-clock time measured against a monotonic
//! epoch taken when capture starts. Output files of one session share a
//! single local-time stamp so the pair can be correlated on disk.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDateTime};

/// Format of the timestamp token embedded in output file names.
pub const SESSION_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A recording clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment recording started).
#[derive(Debug, Clone)]
pub struct RecordingClock {
    /// The instant recording started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl RecordingClock {
    /// Create a new recording clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Time elapsed since recording start.
    pub fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Whether at least `limit` has passed since the epoch.
    pub fn has_elapsed(&self, limit: Duration) -> bool {
        self.epoch.elapsed() >= limit
    }

    /// Wall-clock time at recording start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

/// Timestamp token shared by the artifacts of one session, e.g.
/// `20260314_093005`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionStamp(String);

impl SessionStamp {
    /// Stamp for the current local time.
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn from_datetime<Tz: chrono::TimeZone>(at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(at.format(SESSION_STAMP_FORMAT).to_string())
    }

    /// Parse a token previously produced by [`SessionStamp::as_str`].
    pub fn parse(token: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(token, SESSION_STAMP_FORMAT)
            .ok()
            .map(|_| Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_clock_elapsed() {
        let clock = RecordingClock::start();
        assert!(clock.elapsed() < Duration::from_secs(1));
        assert!(clock.has_elapsed(Duration::ZERO));
        assert!(!clock.has_elapsed(Duration::from_secs(60)));
    }

    #[test]
    fn test_session_stamp_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 5).unwrap();
        let stamp = SessionStamp::from_datetime(&at);
        assert_eq!(stamp.as_str(), "20260314_093005");
        assert_eq!(stamp.to_string(), "20260314_093005");
    }

    #[test]
    fn test_session_stamp_parse() {
        assert!(SessionStamp::parse("20260314_093005").is_some());
        assert!(SessionStamp::parse("2026-03-14").is_none());
        assert!(SessionStamp::parse("20261399_000000").is_none());

        let now = SessionStamp::now();
        assert_eq!(SessionStamp::parse(now.as_str()), Some(now));
    }
}

//! Output artifact naming.
//!
//! Each session writes `original_<stamp>.<ext>` and `inverted_<stamp>.<ext>`
//! into the output directory, both carrying the same stamp.

use std::fmt;
use std::path::{Path, PathBuf};

use tenet_common::clock::SessionStamp;

/// Which of the two files of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Frames in capture order.
    Original,
    /// Frames in reverse capture order.
    Inverted,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Inverted => "inverted",
        }
    }

    /// File name for this kind within a session.
    pub fn file_name(self, stamp: &SessionStamp, extension: &str) -> String {
        format!(
            "{}_{}.{}",
            self.as_str(),
            stamp,
            extension.trim_start_matches('.')
        )
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pair of file paths a session writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub stamp: SessionStamp,
    pub original: PathBuf,
    pub inverted: PathBuf,
}

impl ArtifactPaths {
    pub fn new(output_dir: &Path, stamp: SessionStamp, extension: &str) -> Self {
        Self {
            original: output_dir.join(ArtifactKind::Original.file_name(&stamp, extension)),
            inverted: output_dir.join(ArtifactKind::Inverted.file_name(&stamp, extension)),
            stamp,
        }
    }

    pub fn path(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Original => &self.original,
            ArtifactKind::Inverted => &self.inverted,
        }
    }
}

/// Split a file name produced by [`ArtifactKind::file_name`] back into its
/// kind and stamp.
pub fn parse_artifact_name(file_name: &str) -> Option<(ArtifactKind, SessionStamp)> {
    let stem = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
    let (kind, token) = stem.split_once('_')?;
    let kind = match kind {
        "original" => ArtifactKind::Original,
        "inverted" => ArtifactKind::Inverted,
        _ => return None,
    };
    Some((kind, SessionStamp::parse(token)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> SessionStamp {
        SessionStamp::parse("20260314_093005").unwrap()
    }

    #[test]
    fn test_pair_shares_stamp() {
        let paths = ArtifactPaths::new(Path::new("tenet_recordings"), stamp(), "avi");
        assert_eq!(
            paths.original,
            PathBuf::from("tenet_recordings/original_20260314_093005.avi")
        );
        assert_eq!(
            paths.inverted,
            PathBuf::from("tenet_recordings/inverted_20260314_093005.avi")
        );
    }

    #[test]
    fn test_extension_dot_is_optional() {
        assert_eq!(
            ArtifactKind::Inverted.file_name(&stamp(), ".mkv"),
            "inverted_20260314_093005.mkv"
        );
    }

    #[test]
    fn test_parse_artifact_name() {
        let (kind, parsed) = parse_artifact_name("original_20260314_093005.avi").unwrap();
        assert_eq!(kind, ArtifactKind::Original);
        assert_eq!(parsed, stamp());

        assert!(parse_artifact_name("reversed_20260314_093005.avi").is_none());
        assert!(parse_artifact_name("inverted_latest.avi").is_none());
    }
}

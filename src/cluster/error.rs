// ABOUTME: Cluster config errors with SNAFU context selectors.
// ABOUTME: Carries the file path for every I/O or parse failure.

use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClusterError {
    #[snafu(display("failed to read cluster config {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("malformed cluster config {}: {source}", path.display()))]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("failed to write cluster config {}: {source}", path.display()))]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to encode cluster config: {source}"))]
    Encode { source: serde_json::Error },

    #[snafu(display("cluster has no segments"))]
    NoSegments,

    #[snafu(display("cluster has no master segment (content id -1)"))]
    MissingMaster,
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterErrorKind {
    /// The config file could not be read or written.
    Io,
    /// The config was readable but its contents are unusable.
    Malformed,
}

impl ClusterError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ClusterErrorKind {
        match self {
            ClusterError::Read { .. } | ClusterError::Write { .. } => ClusterErrorKind::Io,
            ClusterError::Parse { .. }
            | ClusterError::Encode { .. }
            | ClusterError::NoSegments
            | ClusterError::MissingMaster => ClusterErrorKind::Malformed,
        }
    }
}

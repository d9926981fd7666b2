// ABOUTME: Cluster topology consumed by the hub: segments and bin dir.
// ABOUTME: Persisted as JSON in the state dir; read-only to the core.

mod error;
mod segment;

pub use error::{ClusterError, ClusterErrorKind};
pub use segment::{MASTER_CONTENT_ID, SegConfig, SegmentRole};

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::durable::write_atomic;

pub const SOURCE_CONFIG_FILENAME: &str = "source_cluster_config.json";
pub const TARGET_CONFIG_FILENAME: &str = "target_cluster_config.json";

pub fn source_config_path(state_dir: &Path) -> PathBuf {
    state_dir.join(SOURCE_CONFIG_FILENAME)
}

pub fn target_config_path(state_dir: &Path) -> PathBuf {
    state_dir.join(TARGET_CONFIG_FILENAME)
}

/// A cluster: segments keyed by content id, plus the bin dir of its binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    segments: BTreeMap<i32, SegConfig>,
    bin_dir: PathBuf,
}

#[derive(Deserialize)]
struct ClusterFile {
    #[serde(deserialize_with = "deserialize_segments")]
    segments: NonEmpty<SegConfig>,
    bin_dir: PathBuf,
}

#[derive(Serialize)]
struct ClusterFileRef<'a> {
    segments: Vec<&'a SegConfig>,
    bin_dir: &'a Path,
}

impl Cluster {
    /// Build a cluster from catalog rows. Requires a master segment.
    pub fn new(
        segments: impl IntoIterator<Item = SegConfig>,
        bin_dir: impl Into<PathBuf>,
    ) -> Result<Self, ClusterError> {
        let segments: BTreeMap<i32, SegConfig> = segments
            .into_iter()
            .map(|seg| (seg.content_id, seg))
            .collect();

        if segments.is_empty() {
            return Err(ClusterError::NoSegments);
        }
        if !segments.contains_key(&MASTER_CONTENT_ID) {
            return Err(ClusterError::MissingMaster);
        }

        Ok(Self {
            segments,
            bin_dir: bin_dir.into(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ClusterError> {
        let content = std::fs::read(path).context(error::ReadSnafu { path })?;
        let file: ClusterFile =
            serde_json::from_slice(&content).context(error::ParseSnafu { path })?;
        Self::new(file.segments, file.bin_dir)
    }

    /// Write the cluster to `path`, replacing any previous file atomically.
    pub fn commit(&self, path: &Path) -> Result<(), ClusterError> {
        let file = ClusterFileRef {
            segments: self.segments.values().collect(),
            bin_dir: &self.bin_dir,
        };
        let json = serde_json::to_vec_pretty(&file).context(error::EncodeSnafu)?;
        write_atomic(path, &json).context(error::WriteSnafu { path })
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Segments in content id order, master first.
    pub fn segments(&self) -> impl Iterator<Item = &SegConfig> {
        self.segments.values()
    }

    fn master(&self) -> &SegConfig {
        &self.segments[&MASTER_CONTENT_ID]
    }

    pub fn master_data_dir(&self) -> &Path {
        &self.master().data_dir
    }

    pub fn master_port(&self) -> u16 {
        self.master().port
    }

    /// Highest port used by any segment, master included.
    pub fn max_port(&self) -> u16 {
        self.segments.values().map(|s| s.port).max().unwrap_or(0)
    }

    /// Distinct segment hostnames, sorted.
    pub fn hostnames(&self) -> Vec<String> {
        self.segments
            .values()
            .map(|s| s.hostname.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Data directories of the non-master segments, in content id order.
    pub fn segment_data_dirs(&self) -> Vec<&Path> {
        self.segments
            .values()
            .filter(|s| !s.is_master())
            .map(|s| s.data_dir.as_path())
            .collect()
    }

    /// Non-master segments placed on `hostname`.
    pub fn segments_on_host<'a>(&'a self, hostname: &'a str) -> impl Iterator<Item = &'a SegConfig> {
        self.segments
            .values()
            .filter(move |s| !s.is_master() && s.hostname == hostname)
    }

    /// Number of segments besides the master.
    pub fn num_primaries(&self) -> u16 {
        u16::try_from(self.segments.len().saturating_sub(1)).unwrap_or(u16::MAX)
    }
}

fn deserialize_segments<'de, D>(deserializer: D) -> std::result::Result<NonEmpty<SegConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<SegConfig> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one segment is required"))
}

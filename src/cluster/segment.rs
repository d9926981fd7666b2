// ABOUTME: Segment descriptor as reported by the cluster catalog.
// ABOUTME: One entry per content id; content id -1 is the master.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Content id of the master (coordinator) segment.
pub const MASTER_CONTENT_ID: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SegmentRole {
    #[default]
    #[serde(rename = "p")]
    Primary,
    #[serde(rename = "m")]
    Mirror,
}

impl SegmentRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "p" => Some(SegmentRole::Primary),
            "m" => Some(SegmentRole::Mirror),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegConfig {
    pub content_id: i32,
    pub db_id: i32,
    pub hostname: String,
    pub port: u16,
    pub data_dir: PathBuf,
    #[serde(default)]
    pub role: SegmentRole,
    #[serde(default)]
    pub preferred_role: SegmentRole,
}

impl SegConfig {
    pub fn is_master(&self) -> bool {
        self.content_id == MASTER_CONTENT_ID
    }
}

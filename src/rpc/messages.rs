// ABOUTME: JSON request and reply bodies for the hub and agent RPC surfaces.
// ABOUTME: Shared by the axum servers and the hyper client.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::checklist::StepStatus;

/// Body of every non-2xx reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PingReply {}

// Agent surface

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFreePortsRequest {
    pub possible_port_base: u16,
    pub num_primaries: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFreePortsReply {
    pub result: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSegmentDataDirsRequest {
    pub datadirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSegmentDataDirsReply {
    pub failures: Vec<DirFailure>,
}

// Hub surface

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfigRequest {
    pub db_port: u16,
    pub old_bin_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfigReply {
    pub config_status: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CheckFreePortsProbeReply {
    pub port_base: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareInitClusterRequest {
    /// Port to read the new cluster's catalog on; the chosen master port
    /// when absent.
    #[serde(default)]
    pub db_port: Option<u16>,
    pub new_bin_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrepareInitClusterReply {
    pub port_base: u16,
    pub master_port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepReply {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpgradeReply {
    pub list_of_upgrade_step_statuses: Vec<StepStatus>,
}

/// Table counts for one database of the source cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountPerDb {
    pub db_name: String,
    pub ao_count: u64,
    pub heap_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckObjectCountReply {
    pub list_of_counts: Vec<CountPerDb>,
}

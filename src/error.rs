// ABOUTME: Application-wide error types for clusterup.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::cluster::ClusterError;
use crate::exec::ExecError;
use crate::hub::FanOutError;
use crate::rpc::ConnectionError;
use crate::types::StepNameError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no free port base found after {attempts} attempts")]
    PortAllocation { attempts: usize },

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    FanOut(#[from] FanOutError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("invalid step name: {0}")]
    Step(#[from] StepNameError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

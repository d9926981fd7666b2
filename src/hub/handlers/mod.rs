// ABOUTME: Hub request handlers, one file per group of steps.
// ABOUTME: Each step handler runs inside Hub::run_step.

mod cluster_ops;
mod config;
mod init_cluster;
mod object_count;

pub use init_cluster::{HOSTFILE_FILENAME, INIT_CONFIG_FILENAME, InitSystemConfig, upgrade_data_dir};

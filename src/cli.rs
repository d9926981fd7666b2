// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the hub and agent daemons and the operator subcommands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clusterup")]
#[command(about = "Hub and agent orchestration for multi-host database cluster upgrades")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory to search for clusterup.yml (defaults to the current directory)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the hub daemon
    Hub {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run the agent daemon on this host
    Agent {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Check that the hub is reachable
    Ping,

    /// Show the state of every upgrade step
    Status,

    /// Read and save the source cluster configuration
    CheckConfig {
        /// Port of the source cluster's master
        #[arg(long)]
        db_port: u16,

        /// Bin directory of the source cluster
        #[arg(long)]
        old_bin_dir: PathBuf,
    },

    /// Find a port base free on every host
    CheckFreePorts,

    /// Count append-optimized and heap tables in each source database
    CheckObjectCount,

    /// Initialize the target cluster
    PrepareInitCluster {
        /// Bin directory of the target cluster
        #[arg(long)]
        new_bin_dir: PathBuf,

        /// Port to read the target catalog on (defaults to the chosen master port)
        #[arg(long)]
        db_port: Option<u16>,
    },

    /// Stop the source and target clusters
    ShutdownClusters,

    /// Start the target cluster
    ValidateStartCluster,
}

// ABOUTME: Entry point for the clusterup CLI application.
// ABOUTME: Parses arguments and dispatches to the daemons or hub requests.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use clusterup::agent::{self, AgentState};
use clusterup::checklist::{ChecklistManager, StepDef};
use clusterup::config::Config;
use clusterup::durable::create_private_dir;
use clusterup::error::Result;
use clusterup::exec::SystemExecutor;
use clusterup::hub::{self, HttpDialer, Hub, PsqlCatalog};
use clusterup::output::{Output, OutputMode};
use clusterup::rpc::HubClient;
use clusterup::rpc::messages::{CheckConfigRequest, PrepareInitClusterRequest};
use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag when set
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let dir = match cli.config_dir {
        Some(dir) => dir,
        None => env::current_dir()?,
    };
    let config = Config::discover_or_default(&dir)?;
    let hub_client = HubClient::new(config.hub_addr());

    output.start_timer();
    match cli.command {
        Commands::Hub { port } => run_hub(&config, port.unwrap_or(config.hub_port)).await,
        Commands::Agent { port } => run_agent(port.unwrap_or(config.agent_port)).await,
        Commands::Ping => {
            hub_client.ping().await?;
            output.success(&format!("Hub at {} is up", hub_client.addr()));
            Ok(())
        }
        Commands::Status => {
            let reply = hub_client.status().await?;
            output.status(&reply.list_of_upgrade_step_statuses);
            Ok(())
        }
        Commands::CheckConfig {
            db_port,
            old_bin_dir,
        } => {
            output.progress("Checking source cluster configuration...");
            let reply = hub_client
                .check_config(&CheckConfigRequest {
                    db_port,
                    old_bin_dir,
                })
                .await?;
            output.success(&format!("Check config request is processed: {}", reply.config_status));
            Ok(())
        }
        Commands::CheckFreePorts => {
            let reply = hub_client.check_free_ports().await?;
            output.success(&format!("Free port base: {}", reply.port_base));
            Ok(())
        }
        Commands::CheckObjectCount => {
            output.progress("Counting tables in the source cluster...");
            let reply = hub_client.check_object_count().await?;
            output.object_counts(&reply.list_of_counts);
            Ok(())
        }
        Commands::PrepareInitCluster {
            new_bin_dir,
            db_port,
        } => {
            output.progress("Initializing target cluster...");
            let reply = hub_client
                .prepare_init_cluster(&PrepareInitClusterRequest {
                    db_port,
                    new_bin_dir,
                })
                .await?;
            output.success(&format!(
                "Target cluster initialized (port base {}, master port {})",
                reply.port_base, reply.master_port
            ));
            Ok(())
        }
        Commands::ShutdownClusters => {
            output.progress("Stopping source and target clusters...");
            hub_client.shutdown_clusters().await?;
            output.success("Clusters stopped");
            Ok(())
        }
        Commands::ValidateStartCluster => {
            output.progress("Starting target cluster...");
            hub_client.validate_start_cluster().await?;
            output.success("Target cluster started");
            Ok(())
        }
    }
}

async fn run_hub(config: &Config, port: u16) -> Result<()> {
    create_private_dir(&config.state_dir)?;

    let checklist = Arc::new(ChecklistManager::new(&config.state_dir));
    checklist.load_steps(&StepDef::defaults());

    let executor = Arc::new(SystemExecutor);
    let hub = Hub::new(
        &config.state_dir,
        checklist,
        executor.clone(),
        Arc::new(PsqlCatalog::new(executor, "localhost")),
        Arc::new(HttpDialer::new(config.agent_port)),
    )
    .with_fanout(config.fanout.fanout());

    tracing::info!("Hub state directory: {}", config.state_dir.display());
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    hub::server::serve(listener, Arc::new(hub), shutdown_signal()).await
}

async fn run_agent(port: u16) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    agent::serve(listener, AgentState::new(Arc::new(SystemExecutor)), shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Unable to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

// ABOUTME: Per-host agent serving host-local RPCs to the hub.
// ABOUTME: Routes: /ping, /check-free-ports, /create-segment-data-dirs.

mod dirs;
mod ports;

pub use dirs::create_segment_data_dirs;
pub use ports::{check_free_ports, conflicting_ports_script};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::exec::CommandExecutor;
use crate::rpc::ApiError;
use crate::rpc::messages::{
    CheckFreePortsReply, CheckFreePortsRequest, CreateSegmentDataDirsReply,
    CreateSegmentDataDirsRequest, PingReply,
};

/// Shared state of the agent server.
#[derive(Clone)]
pub struct AgentState {
    executor: Arc<dyn CommandExecutor>,
}

impl AgentState {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

pub fn router(state: AgentState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/check-free-ports", post(check_free_ports_handler))
        .route("/create-segment-data-dirs", post(create_segment_data_dirs_handler))
        .with_state(state)
}

/// Serve the agent on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AgentState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    crate::rpc::server::serve(listener, router(state), shutdown).await?;
    Ok(())
}

async fn ping() -> Json<PingReply> {
    Json(PingReply {})
}

async fn check_free_ports_handler(
    State(state): State<AgentState>,
    Json(req): Json<CheckFreePortsRequest>,
) -> std::result::Result<Json<CheckFreePortsReply>, ApiError> {
    tracing::info!("Got a request to check free ports from the hub");

    let result = check_free_ports(
        state.executor.as_ref(),
        req.possible_port_base,
        req.num_primaries,
    )
    .await
    .map_err(|e| {
        tracing::error!("Free port check failed: {}", e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(CheckFreePortsReply { result }))
}

async fn create_segment_data_dirs_handler(
    Json(req): Json<CreateSegmentDataDirsRequest>,
) -> std::result::Result<Json<CreateSegmentDataDirsReply>, ApiError> {
    tracing::info!("Got a request to create {} segment data directories", req.datadirs.len());

    let failures = create_segment_data_dirs(&req.datadirs).await;
    if failures.is_empty() {
        return Ok(Json(CreateSegmentDataDirsReply::default()));
    }

    let summary = failures
        .iter()
        .map(|f| format!("{}: {}", f.path.display(), f.error))
        .collect::<Vec<_>>()
        .join("; ");
    Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, summary))
}

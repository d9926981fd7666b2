// ABOUTME: HTTP surface of the hub, served with axum.
// ABOUTME: Thin handlers translating JSON bodies into Hub calls.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::rpc::ApiError;
use crate::rpc::messages::{
    CheckConfigReply, CheckConfigRequest, CheckFreePortsProbeReply, CheckObjectCountReply,
    PingReply, PrepareInitClusterReply, PrepareInitClusterRequest, StatusUpgradeReply, StepReply,
};

use super::Hub;

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

pub fn router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/status", get(status))
        .route("/check-config", post(check_config))
        .route("/check-free-ports", post(check_free_ports))
        .route("/check-object-count", post(check_object_count))
        .route("/prepare-init-cluster", post(prepare_init_cluster))
        .route("/shutdown-clusters", post(shutdown_clusters))
        .route("/validate-start-cluster", post(validate_start_cluster))
        .with_state(hub)
}

/// Serve the hub on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, hub: Arc<Hub>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    crate::rpc::server::serve(listener, router(hub), shutdown).await?;
    Ok(())
}

async fn ping(State(hub): State<Arc<Hub>>) -> Json<PingReply> {
    Json(hub.ping())
}

async fn status(State(hub): State<Arc<Hub>>) -> Json<StatusUpgradeReply> {
    Json(hub.status_upgrade())
}

async fn check_config(
    State(hub): State<Arc<Hub>>,
    Json(req): Json<CheckConfigRequest>,
) -> ApiResult<CheckConfigReply> {
    Ok(Json(hub.check_config(req).await?))
}

async fn check_free_ports(State(hub): State<Arc<Hub>>) -> ApiResult<CheckFreePortsProbeReply> {
    Ok(Json(hub.check_free_ports().await?))
}

async fn check_object_count(State(hub): State<Arc<Hub>>) -> ApiResult<CheckObjectCountReply> {
    Ok(Json(hub.check_object_count().await?))
}

async fn prepare_init_cluster(
    State(hub): State<Arc<Hub>>,
    Json(req): Json<PrepareInitClusterRequest>,
) -> ApiResult<PrepareInitClusterReply> {
    Ok(Json(hub.prepare_init_cluster(req).await?))
}

async fn shutdown_clusters(State(hub): State<Arc<Hub>>) -> ApiResult<StepReply> {
    hub.shutdown_clusters().await?;
    Ok(Json(StepReply {}))
}

async fn validate_start_cluster(State(hub): State<Arc<Hub>>) -> ApiResult<StepReply> {
    hub.validate_start_cluster().await?;
    Ok(Json(StepReply {}))
}

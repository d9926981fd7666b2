// ABOUTME: Typed client for the hub's HTTP surface.
// ABOUTME: Used by the CLI subcommands that drive an upgrade.

use super::client::{get_json, post_json};
use super::error::ConnectionError;
use super::messages::{
    CheckConfigReply, CheckConfigRequest, CheckFreePortsProbeReply, CheckObjectCountReply,
    PingReply, PrepareInitClusterReply, PrepareInitClusterRequest, StatusUpgradeReply, StepReply,
};

#[derive(Debug, Clone)]
pub struct HubClient {
    addr: String,
}

impl HubClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub async fn ping(&self) -> Result<PingReply, ConnectionError> {
        get_json(&self.addr, "/ping").await
    }

    pub async fn status(&self) -> Result<StatusUpgradeReply, ConnectionError> {
        get_json(&self.addr, "/status").await
    }

    pub async fn check_config(&self, req: &CheckConfigRequest) -> Result<CheckConfigReply, ConnectionError> {
        post_json(&self.addr, "/check-config", req).await
    }

    pub async fn check_free_ports(&self) -> Result<CheckFreePortsProbeReply, ConnectionError> {
        post_json(&self.addr, "/check-free-ports", &StepReply {}).await
    }

    pub async fn check_object_count(&self) -> Result<CheckObjectCountReply, ConnectionError> {
        post_json(&self.addr, "/check-object-count", &StepReply {}).await
    }

    pub async fn prepare_init_cluster(
        &self,
        req: &PrepareInitClusterRequest,
    ) -> Result<PrepareInitClusterReply, ConnectionError> {
        post_json(&self.addr, "/prepare-init-cluster", req).await
    }

    pub async fn shutdown_clusters(&self) -> Result<StepReply, ConnectionError> {
        post_json(&self.addr, "/shutdown-clusters", &StepReply {}).await
    }

    pub async fn validate_start_cluster(&self) -> Result<StepReply, ConnectionError> {
        post_json(&self.addr, "/validate-start-cluster", &StepReply {}).await
    }
}

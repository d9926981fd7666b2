// ABOUTME: The hub's roster of agent connections.
// ABOUTME: Each connection pairs a hostname with a client for its agent RPCs.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::rpc::ConnectionError;
use crate::rpc::client::{get_json, post_json};
use crate::rpc::messages::{
    CheckFreePortsReply, CheckFreePortsRequest, CreateSegmentDataDirsReply,
    CreateSegmentDataDirsRequest, PingReply,
};

/// The RPCs an agent serves to the hub.
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn ping(&self) -> Result<(), ConnectionError>;

    async fn check_free_ports(
        &self,
        req: CheckFreePortsRequest,
    ) -> Result<CheckFreePortsReply, ConnectionError>;

    async fn create_segment_data_dirs(
        &self,
        req: CreateSegmentDataDirsRequest,
    ) -> Result<CreateSegmentDataDirsReply, ConnectionError>;
}

/// One live agent: its hostname and RPC client.
#[derive(Clone)]
pub struct AgentConnection {
    pub hostname: String,
    pub client: Arc<dyn AgentClient>,
}

impl AgentConnection {
    pub fn new(hostname: impl Into<String>, client: Arc<dyn AgentClient>) -> Self {
        Self {
            hostname: hostname.into(),
            client,
        }
    }
}

impl fmt::Debug for AgentConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConnection")
            .field("hostname", &self.hostname)
            .finish()
    }
}

/// Creates clients for agents by hostname.
pub trait AgentDialer: Send + Sync {
    fn dial(&self, hostname: &str) -> Result<Arc<dyn AgentClient>, ConnectionError>;
}

/// Dials agents over HTTP on a fixed port.
#[derive(Debug, Clone, Copy)]
pub struct HttpDialer {
    port: u16,
}

impl HttpDialer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl AgentDialer for HttpDialer {
    fn dial(&self, hostname: &str) -> Result<Arc<dyn AgentClient>, ConnectionError> {
        if hostname.is_empty() {
            return Err(ConnectionError::Connect {
                addr: String::new(),
                reason: "empty hostname".to_string(),
            });
        }
        Ok(Arc::new(HttpAgentClient::new(format!(
            "{}:{}",
            hostname, self.port
        ))))
    }
}

/// Agent client speaking JSON over HTTP/1.
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    addr: String,
}

impl HttpAgentClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn ping(&self) -> Result<(), ConnectionError> {
        let _: PingReply = get_json(&self.addr, "/ping").await?;
        Ok(())
    }

    async fn check_free_ports(
        &self,
        req: CheckFreePortsRequest,
    ) -> Result<CheckFreePortsReply, ConnectionError> {
        post_json(&self.addr, "/check-free-ports", &req).await
    }

    async fn create_segment_data_dirs(
        &self,
        req: CreateSegmentDataDirsRequest,
    ) -> Result<CreateSegmentDataDirsReply, ConnectionError> {
        post_json(&self.addr, "/create-segment-data-dirs", &req).await
    }
}

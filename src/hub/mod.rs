// ABOUTME: The hub: central orchestrator of an upgrade run.
// ABOUTME: Drives checklist steps and fans out work to per-host agents.

mod catalog;
mod connection;
mod fanout;
mod handlers;
mod ports;
pub mod server;

pub use catalog::{
    ClusterCatalog, DATABASE_NAMES_QUERY, OBJECT_COUNT_QUERY, PsqlCatalog, SEGMENT_CONFIGURATION_QUERY,
    parse_count_row, parse_segment_rows,
};
pub use connection::{AgentClient, AgentConnection, AgentDialer, HttpAgentClient, HttpDialer};
pub use fanout::{DEFAULT_MAX_PARALLELISM, FanOut, FanOutError, HostFailure};
pub use handlers::{HOSTFILE_FILENAME, INIT_CONFIG_FILENAME, InitSystemConfig, upgrade_data_dir};
pub use ports::{
    AgentPortCheck, FreePortCheck, MAX_PORT_BASE_ATTEMPTS, MIN_RANDOM_PORT_BASE, ReservedPortCheck,
    get_free_port_base, get_new_master_port,
};

use parking_lot::Mutex;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::checklist::{ChecklistManager, UpgradeStep};
use crate::cluster::{Cluster, source_config_path, target_config_path};
use crate::error::Result;
use crate::exec::CommandExecutor;
use crate::rpc::messages::{PingReply, StatusUpgradeReply};

/// Hub state shared by every request handler.
pub struct Hub {
    state_dir: PathBuf,
    hostname: String,
    checklist: Arc<ChecklistManager>,
    executor: Arc<dyn CommandExecutor>,
    catalog: Arc<dyn ClusterCatalog>,
    dialer: Arc<dyn AgentDialer>,
    fanout: FanOut,
    conns: Mutex<Option<Arc<[AgentConnection]>>>,
}

impl Hub {
    pub fn new(
        state_dir: impl Into<PathBuf>,
        checklist: Arc<ChecklistManager>,
        executor: Arc<dyn CommandExecutor>,
        catalog: Arc<dyn ClusterCatalog>,
        dialer: Arc<dyn AgentDialer>,
    ) -> Self {
        Self {
            state_dir: state_dir.into(),
            hostname: gethostname::gethostname().to_string_lossy().into_owned(),
            checklist,
            executor,
            catalog,
            dialer,
            fanout: FanOut::default(),
            conns: Mutex::new(None),
        }
    }

    pub fn with_fanout(mut self, fanout: FanOut) -> Self {
        self.fanout = fanout;
        self
    }

    /// Hostname written as the target master's host.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn checklist(&self) -> &ChecklistManager {
        &self.checklist
    }

    pub fn ping(&self) -> PingReply {
        PingReply {}
    }

    pub fn status_upgrade(&self) -> StatusUpgradeReply {
        StatusUpgradeReply {
            list_of_upgrade_step_statuses: self.checklist.status_report(),
        }
    }

    /// Connections to the agent on every source cluster host.
    ///
    /// Dialed once from the saved source config and cached; the returned
    /// snapshot never changes underneath a caller.
    pub fn agent_conns(&self) -> Result<Arc<[AgentConnection]>> {
        let mut cached = self.conns.lock();
        if let Some(conns) = cached.as_ref() {
            return Ok(Arc::clone(conns));
        }

        let source = self.source_cluster()?;
        let conns = source
            .hostnames()
            .into_iter()
            .map(|hostname| {
                let client = self.dialer.dial(&hostname)?;
                Ok(AgentConnection::new(hostname, client))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Dialed {} agent(s)", conns.len());
        let conns: Arc<[AgentConnection]> = conns.into();
        *cached = Some(Arc::clone(&conns));
        Ok(conns)
    }

    fn forget_agent_conns(&self) {
        *self.conns.lock() = None;
    }

    pub fn source_cluster(&self) -> Result<Cluster> {
        Ok(Cluster::load(&source_config_path(&self.state_dir))?)
    }

    pub fn target_cluster(&self) -> Result<Cluster> {
        Ok(Cluster::load(&target_config_path(&self.state_dir))?)
    }

    /// Run `work` as `step`: mark it running, then complete or failed.
    ///
    /// The terminal state is persisted before the result is returned. A
    /// step whose completion cannot be recorded is marked failed.
    async fn run_step<T, Fut>(&self, step: UpgradeStep, work: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let writer = self.checklist.get_step_writer(&step.step_name());
        writer.mark_in_progress()?;
        tracing::info!("Starting step {}", step);

        let result = match work.await {
            Ok(value) => writer.mark_complete().map(|()| value),
            Err(e) => Err(e),
        };

        match result {
            Ok(value) => {
                tracing::info!("Step {} complete", step);
                Ok(value)
            }
            Err(e) => {
                tracing::error!("Step {} failed: {}", step, e);
                if let Err(mark_err) = writer.mark_failed() {
                    tracing::error!("Unable to record failure of step {}: {}", step, mark_err);
                }
                Err(e)
            }
        }
    }
}

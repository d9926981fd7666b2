// ABOUTME: Test support utilities.
// ABOUTME: Fake executor, agents, catalog, and dialer for hub tests.

#![allow(dead_code)]

use async_trait::async_trait;
use clusterup::cluster::{SegConfig, SegmentRole};
use clusterup::exec::{CommandExecutor, CommandOutput, ExecError};
use clusterup::hub::{AgentClient, AgentConnection, AgentDialer, ClusterCatalog};
use clusterup::rpc::ConnectionError;
use clusterup::rpc::messages::{
    CheckFreePortsReply, CheckFreePortsRequest, CountPerDb, CreateSegmentDataDirsReply,
    CreateSegmentDataDirsRequest,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("clusterup=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

type Responder = dyn Fn(&str, &[String]) -> Result<CommandOutput, ExecError> + Send + Sync;

/// Executor that records every command and answers from a closure.
pub struct FakeExecutor {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    responder: Box<Responder>,
}

impl FakeExecutor {
    /// Every command succeeds with empty output.
    pub fn succeeding() -> Self {
        Self::with(|_, _| Ok(ok_output("")))
    }

    pub fn with<F>(responder: F) -> Self
    where
        F: Fn(&str, &[String]) -> Result<CommandOutput, ExecError> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().clone()
    }

    /// Each call rendered as one space-joined line.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(program, args)| {
                std::iter::once(program)
                    .chain(args)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        self.calls.lock().push((program.to_string(), args.to_vec()));
        (self.responder)(program, args)
    }
}

pub fn ok_output(stdout: &str) -> CommandOutput {
    CommandOutput {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed_output(stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

type FreeAnswer = dyn Fn(CheckFreePortsRequest) -> Result<bool, ConnectionError> + Send + Sync;

/// Agent double that counts calls and answers port checks from a closure.
pub struct FakeAgent {
    pub hostname: String,
    free: Box<FreeAnswer>,
    fail_dirs: bool,
    pub check_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub checked: Mutex<Vec<CheckFreePortsRequest>>,
    pub created: Mutex<Vec<PathBuf>>,
}

impl FakeAgent {
    pub fn free(hostname: &str) -> Arc<Self> {
        Self::answering(hostname, |_| Ok(true))
    }

    pub fn busy(hostname: &str) -> Arc<Self> {
        Self::answering(hostname, |_| Ok(false))
    }

    pub fn unreachable(hostname: &str) -> Arc<Self> {
        let addr = hostname.to_string();
        Self::answering(hostname, move |_| {
            Err(ConnectionError::Connect {
                addr: addr.clone(),
                reason: "connection refused".to_string(),
            })
        })
    }

    pub fn answering<F>(hostname: &str, free: F) -> Arc<Self>
    where
        F: Fn(CheckFreePortsRequest) -> Result<bool, ConnectionError> + Send + Sync + 'static,
    {
        Arc::new(Self::build(hostname, Box::new(free), false))
    }

    /// Answers port checks as free but fails directory creation.
    pub fn failing_dirs(hostname: &str) -> Arc<Self> {
        Arc::new(Self::build(hostname, Box::new(|_| Ok(true)), true))
    }

    fn build(hostname: &str, free: Box<FreeAnswer>, fail_dirs: bool) -> Self {
        Self {
            hostname: hostname.to_string(),
            free,
            fail_dirs,
            check_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            checked: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn check_count(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn connection(self: &Arc<Self>) -> AgentConnection {
        AgentConnection::new(self.hostname.clone(), Arc::clone(self) as Arc<dyn AgentClient>)
    }
}

#[async_trait]
impl AgentClient for FakeAgent {
    async fn ping(&self) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn check_free_ports(
        &self,
        req: CheckFreePortsRequest,
    ) -> Result<CheckFreePortsReply, ConnectionError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        self.checked.lock().push(req);
        (self.free)(req).map(|result| CheckFreePortsReply { result })
    }

    async fn create_segment_data_dirs(
        &self,
        req: CreateSegmentDataDirsRequest,
    ) -> Result<CreateSegmentDataDirsReply, ConnectionError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_dirs {
            return Err(ConnectionError::Remote {
                addr: self.hostname.clone(),
                status: 500,
                message: "permission denied".to_string(),
            });
        }
        self.created.lock().extend(req.datadirs);
        Ok(CreateSegmentDataDirsReply::default())
    }
}

/// Dialer handing out pre-built fake agents by hostname.
#[derive(Default)]
pub struct FakeDialer {
    agents: HashMap<String, Arc<FakeAgent>>,
}

impl FakeDialer {
    pub fn new(agents: &[Arc<FakeAgent>]) -> Self {
        Self {
            agents: agents
                .iter()
                .map(|a| (a.hostname.clone(), Arc::clone(a)))
                .collect(),
        }
    }
}

impl AgentDialer for FakeDialer {
    fn dial(&self, hostname: &str) -> Result<Arc<dyn AgentClient>, ConnectionError> {
        self.agents
            .get(hostname)
            .map(|a| Arc::clone(a) as Arc<dyn AgentClient>)
            .ok_or_else(|| ConnectionError::Connect {
                addr: hostname.to_string(),
                reason: "no such agent".to_string(),
            })
    }
}

/// Catalog answering from fixed per-port segment lists and table counts.
#[derive(Default)]
pub struct FakeCatalog {
    clusters: HashMap<u16, Vec<SegConfig>>,
    counts: HashMap<u16, Vec<CountPerDb>>,
    pub queried: Mutex<Vec<u16>>,
}

impl FakeCatalog {
    pub fn with_cluster(mut self, port: u16, segments: Vec<SegConfig>) -> Self {
        self.clusters.insert(port, segments);
        self
    }

    pub fn with_counts(mut self, port: u16, counts: Vec<CountPerDb>) -> Self {
        self.counts.insert(port, counts);
        self
    }
}

#[async_trait]
impl ClusterCatalog for FakeCatalog {
    async fn segment_configuration(&self, port: u16) -> Result<Vec<SegConfig>, ConnectionError> {
        self.queried.lock().push(port);
        self.clusters
            .get(&port)
            .cloned()
            .ok_or_else(|| ConnectionError::Database(format!("could not connect to port {}", port)))
    }

    async fn count_objects(&self, port: u16) -> Result<Vec<CountPerDb>, ConnectionError> {
        self.queried.lock().push(port);
        self.counts
            .get(&port)
            .cloned()
            .ok_or_else(|| ConnectionError::Database(format!("could not connect to port {}", port)))
    }
}

pub fn count(db_name: &str, ao_count: u64, heap_count: u64) -> CountPerDb {
    CountPerDb {
        db_name: db_name.to_string(),
        ao_count,
        heap_count,
    }
}

pub fn seg(content_id: i32, host: &str, port: u16, dir: &str) -> SegConfig {
    SegConfig {
        content_id,
        db_id: content_id + 2,
        hostname: host.to_string(),
        port,
        data_dir: PathBuf::from(dir),
        role: SegmentRole::Primary,
        preferred_role: SegmentRole::Primary,
    }
}

/// Master on `mdw:15432` and two primaries on `sdw1`/`sdw2`.
pub fn source_segments() -> Vec<SegConfig> {
    vec![
        seg(-1, "mdw", 15432, "/data/master/gpseg-1"),
        seg(0, "sdw1", 25432, "/data/primary/gpseg0"),
        seg(1, "sdw2", 25433, "/data/primary/gpseg1"),
    ]
}

/// Target cluster as gpinitsystem would leave it.
pub fn target_segments(master_port: u16, port_base: u16) -> Vec<SegConfig> {
    vec![
        seg(-1, "mdw", master_port, "/data/master/gpseg-1_upgrade/gpseg-1"),
        seg(0, "sdw1", port_base, "/data/primary_upgrade/gpseg0"),
        seg(1, "sdw2", port_base + 1, "/data/primary_upgrade/gpseg1"),
    ]
}

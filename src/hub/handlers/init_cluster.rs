// ABOUTME: Prepares and initializes the target cluster.
// ABOUTME: Allocates ports, creates data dirs, and runs gpinitsystem.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::checklist::UpgradeStep;
use crate::cluster::{Cluster, target_config_path};
use crate::durable::{create_private_dir, write_atomic};
use crate::error::{Error, Result};
use crate::exec::run_checked;
use crate::hub::Hub;
use crate::hub::connection::AgentConnection;
use crate::hub::ports::{
    AgentPortCheck, ReservedPortCheck, get_free_port_base, get_new_master_port,
};
use crate::rpc::ConnectionError;
use crate::rpc::messages::{
    CreateSegmentDataDirsRequest, PrepareInitClusterReply, PrepareInitClusterRequest,
};

pub const INIT_CONFIG_FILENAME: &str = "gpinitsystem_config";
pub const HOSTFILE_FILENAME: &str = "hostfile";

/// `<parent of data_dir>_upgrade`, the target directory for a segment.
pub fn upgrade_data_dir(data_dir: &Path) -> PathBuf {
    let parent = data_dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(data_dir);
    with_upgrade_suffix(parent)
}

fn with_upgrade_suffix(path: &Path) -> PathBuf {
    let mut upgraded = path.as_os_str().to_owned();
    upgraded.push("_upgrade");
    PathBuf::from(upgraded)
}

/// Contents of the `gpinitsystem_config` file for the target cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitSystemConfig {
    pub seg_prefix: String,
    pub port_base: u16,
    pub data_dirs: Vec<PathBuf>,
    pub master_hostname: String,
    pub master_dir: PathBuf,
    pub master_port: u16,
}

impl InitSystemConfig {
    pub fn from_source(
        source: &Cluster,
        port_base: u16,
        master_port: u16,
        master_hostname: &str,
    ) -> Result<Self> {
        let master_dir = source.master_data_dir();
        let base_name = master_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        // gpseg-1 -> gpseg
        let keep = base_name
            .chars()
            .count()
            .checked_sub(2)
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                Error::Config(format!(
                    "master data directory {} has no segment prefix",
                    master_dir.display()
                ))
            })?;
        let seg_prefix: String = base_name.chars().take(keep).collect();

        Ok(Self {
            seg_prefix,
            port_base,
            data_dirs: source.segment_data_dirs().into_iter().map(upgrade_data_dir).collect(),
            master_hostname: master_hostname.to_string(),
            master_dir: with_upgrade_suffix(master_dir),
            master_port,
        })
    }

    pub fn render(&self) -> String {
        let data_dirs = self
            .data_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");

        let lines = [
            "ARRAY_NAME=\"gp_upgrade cluster\"".to_string(),
            format!("SEG_PREFIX={}", self.seg_prefix),
            format!("PORT_BASE={}", self.port_base),
            format!("declare -a DATA_DIRECTORY=({})", data_dirs),
            format!("MASTER_HOSTNAME={}", self.master_hostname),
            format!("MASTER_DIRECTORY={}", self.master_dir.display()),
            format!("MASTER_PORT={}", self.master_port),
            "TRUSTED_SHELL=ssh".to_string(),
            "CHECK_POINT_SEGMENTS=8".to_string(),
            "ENCODING=UNICODE".to_string(),
        ];
        let mut rendered = lines.join("\n");
        rendered.push('\n');
        rendered
    }
}

fn render_hostfile(source: &Cluster) -> String {
    let mut hostfile = source.hostnames().join("\n");
    hostfile.push('\n');
    hostfile
}

impl Hub {
    /// Stand up the target cluster next to the source.
    pub async fn prepare_init_cluster(
        &self,
        req: PrepareInitClusterRequest,
    ) -> Result<PrepareInitClusterReply> {
        self.run_step(UpgradeStep::InitCluster, async {
            let source = self.source_cluster()?;
            let conns = self.agent_conns()?;

            // Master first; the segment range must then stay clear of it
            let master_port = get_new_master_port(self.executor.as_ref(), source.master_port()).await?;
            let agents = AgentPortCheck::new(&self.fanout, &conns);
            let check = ReservedPortCheck::new(&agents, master_port);
            let mut rng = StdRng::from_entropy();
            let port_base = get_free_port_base(
                source.max_port().max(master_port),
                source.num_primaries(),
                &check,
                &mut rng,
            )
            .await?;

            self.create_target_data_dirs(&source, &conns).await?;

            let init = InitSystemConfig::from_source(&source, port_base, master_port, &self.hostname)?;
            create_private_dir(&self.state_dir)?;
            let config_path = self.state_dir.join(INIT_CONFIG_FILENAME);
            let hostfile_path = self.state_dir.join(HOSTFILE_FILENAME);
            write_atomic(&config_path, init.render().as_bytes())?;
            write_atomic(&hostfile_path, render_hostfile(&source).as_bytes())?;

            let gpinitsystem = req.new_bin_dir.join("gpinitsystem");
            run_checked(
                self.executor.as_ref(),
                &gpinitsystem.to_string_lossy(),
                &[
                    "-a".to_string(),
                    "-c".to_string(),
                    config_path.to_string_lossy().into_owned(),
                    "-h".to_string(),
                    hostfile_path.to_string_lossy().into_owned(),
                ],
            )
            .await?;

            let target_port = req.db_port.unwrap_or(master_port);
            let segments = self.catalog.segment_configuration(target_port).await?;
            let target = Cluster::new(segments, req.new_bin_dir.clone())?;
            target.commit(&target_config_path(&self.state_dir))?;

            Ok(PrepareInitClusterReply {
                port_base,
                master_port,
            })
        })
        .await
    }

    /// Ask each agent to create the target data dirs of its own segments.
    async fn create_target_data_dirs(&self, source: &Cluster, conns: &[AgentConnection]) -> Result<()> {
        let mut per_host: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for conn in conns {
            let dirs = per_host.entry(conn.hostname.clone()).or_default();
            for seg in source.segments_on_host(&conn.hostname) {
                let dir = upgrade_data_dir(&seg.data_dir);
                if !dirs.contains(&dir) {
                    dirs.push(dir);
                }
            }
        }

        self.fanout
            .each(conns, move |conn| {
                let datadirs = per_host.get(&conn.hostname).cloned().unwrap_or_default();
                async move {
                    if datadirs.is_empty() {
                        return Ok(());
                    }
                    let reply = conn
                        .client
                        .create_segment_data_dirs(CreateSegmentDataDirsRequest { datadirs })
                        .await?;
                    match reply.failures.first() {
                        None => Ok(()),
                        Some(failure) => Err(ConnectionError::Remote {
                            addr: conn.hostname.clone(),
                            status: 500,
                            message: format!("{}: {}", failure.path.display(), failure.error),
                        }),
                    }
                }
            })
            .await?;
        Ok(())
    }
}

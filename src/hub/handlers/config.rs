// ABOUTME: Source cluster discovery and the read-only free port check.
// ABOUTME: check_config persists the topology every later step reads.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::checklist::UpgradeStep;
use crate::cluster::{Cluster, source_config_path};
use crate::durable::create_private_dir;
use crate::error::Result;
use crate::hub::Hub;
use crate::hub::ports::{AgentPortCheck, get_free_port_base};
use crate::rpc::messages::{CheckConfigReply, CheckConfigRequest, CheckFreePortsProbeReply};

impl Hub {
    /// Read the source cluster's segment configuration and save it.
    pub async fn check_config(&self, req: CheckConfigRequest) -> Result<CheckConfigReply> {
        self.run_step(UpgradeStep::Config, async {
            let segments = self.catalog.segment_configuration(req.db_port).await?;
            let cluster = Cluster::new(segments, req.old_bin_dir.clone())?;

            create_private_dir(&self.state_dir)?;
            cluster.commit(&source_config_path(&self.state_dir))?;
            self.forget_agent_conns();

            tracing::info!(
                "Saved source cluster config with {} segment(s)",
                cluster.segments().count()
            );
            Ok(CheckConfigReply {
                config_status: "All good".to_string(),
            })
        })
        .await
    }

    /// Find a port base free on every agent host without recording a step.
    pub async fn check_free_ports(&self) -> Result<CheckFreePortsProbeReply> {
        let source = self.source_cluster()?;
        let conns = self.agent_conns()?;
        let check = AgentPortCheck::new(&self.fanout, &conns);
        let mut rng = StdRng::from_entropy();

        let port_base =
            get_free_port_base(source.max_port(), source.num_primaries(), &check, &mut rng).await?;
        Ok(CheckFreePortsProbeReply { port_base })
    }
}

// ABOUTME: Stop and start steps run against the source and target clusters.
// ABOUTME: Each command runs with the cluster's own bin dir environment.

use crate::checklist::UpgradeStep;
use crate::cluster::Cluster;
use crate::error::Result;
use crate::exec::run_shell;
use crate::hub::Hub;

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// `source <bin>/../greenplum_path.sh && <bin>/<utility> -a -d <master dir>`
pub(crate) fn utility_script(cluster: &Cluster, utility: &str) -> String {
    let bin_dir = cluster.bin_dir().display().to_string();
    format!(
        "source {path} && {utility} -a -d {master_dir}",
        path = shell_quote(&format!("{}/../greenplum_path.sh", bin_dir)),
        utility = shell_quote(&format!("{}/{}", bin_dir, utility)),
        master_dir = shell_quote(&cluster.master_data_dir().display().to_string()),
    )
}

impl Hub {
    /// Stop the source cluster, then the target.
    pub async fn shutdown_clusters(&self) -> Result<()> {
        self.run_step(UpgradeStep::ShutdownClusters, async {
            let source = self.source_cluster()?;
            let target = self.target_cluster()?;

            tracing::info!("Stopping source cluster");
            run_shell(self.executor.as_ref(), &utility_script(&source, "gpstop")).await?;

            tracing::info!("Stopping target cluster");
            run_shell(self.executor.as_ref(), &utility_script(&target, "gpstop")).await?;
            Ok(())
        })
        .await
    }

    /// Start the target cluster to prove it comes up.
    pub async fn validate_start_cluster(&self) -> Result<()> {
        self.run_step(UpgradeStep::ValidateStartCluster, async {
            let target = self.target_cluster()?;

            tracing::info!("Starting target cluster");
            run_shell(self.executor.as_ref(), &utility_script(&target, "gpstart")).await?;
            Ok(())
        })
        .await
    }
}

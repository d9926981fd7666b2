// ABOUTME: Per-database table counts of the source cluster.
// ABOUTME: Read-only; operators compare the counts before and after an upgrade.

use crate::error::Result;
use crate::hub::Hub;
use crate::rpc::messages::CheckObjectCountReply;

impl Hub {
    /// Count append-optimized and heap tables in every source database.
    pub async fn check_object_count(&self) -> Result<CheckObjectCountReply> {
        tracing::info!("Starting object count check");

        let source = self.source_cluster()?;
        let list_of_counts = self.catalog.count_objects(source.master_port()).await?;

        tracing::info!("Counted tables in {} database(s)", list_of_counts.len());
        Ok(CheckObjectCountReply { list_of_counts })
    }
}

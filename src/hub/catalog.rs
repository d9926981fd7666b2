// ABOUTME: Reads a running cluster's segment configuration and table counts.
// ABOUTME: The default source shells out to psql against each database.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cluster::{SegConfig, SegmentRole};
use crate::exec::{CommandExecutor, run_checked};
use crate::rpc::ConnectionError;
use crate::rpc::messages::CountPerDb;

/// Primary segments and the master, one row each.
pub const SEGMENT_CONFIGURATION_QUERY: &str = "SELECT content, dbid, hostname, port, datadir, \
     role, preferred_role FROM gp_segment_configuration WHERE role = 'p' ORDER BY content";

/// Every database a user can connect to.
pub const DATABASE_NAMES_QUERY: &str =
    "SELECT datname FROM pg_database WHERE datname != 'template0' ORDER BY datname";

/// User tables in the current database, split into append-optimized and
/// heap. Temp tables, system tables and partition parents are excluded.
pub const OBJECT_COUNT_QUERY: &str = "\
SELECT count(CASE WHEN c.relstorage IN ('a', 'c') THEN 1 END), \
       count(CASE WHEN c.relstorage NOT IN ('a', 'c') THEN 1 END) \
  FROM pg_class c JOIN pg_namespace n ON c.relnamespace = n.oid \
 WHERE c.relkind = CAST('r' AS CHAR) \
   AND n.nspname NOT LIKE 'pg_temp_%' \
   AND c.oid >= 16384 \
   AND (c.relnamespace >= 16384 OR n.nspname = 'public') \
   AND (NOT c.relhassubclass \
        OR (NOT EXISTS (SELECT 1 FROM pg_partition_rule p WHERE c.oid = p.parchildrelid) \
            AND NOT EXISTS (SELECT 1 FROM pg_partition p WHERE c.oid = p.parrelid)))";

/// Catalog access for the cluster whose master listens on a given port.
#[async_trait]
pub trait ClusterCatalog: Send + Sync {
    async fn segment_configuration(&self, port: u16) -> Result<Vec<SegConfig>, ConnectionError>;

    /// Append-optimized and heap table counts for every database.
    async fn count_objects(&self, port: u16) -> Result<Vec<CountPerDb>, ConnectionError>;
}

/// Catalog reader that runs `psql` through a command executor.
pub struct PsqlCatalog {
    executor: Arc<dyn CommandExecutor>,
    host: String,
}

impl PsqlCatalog {
    pub fn new(executor: Arc<dyn CommandExecutor>, host: impl Into<String>) -> Self {
        Self {
            executor,
            host: host.into(),
        }
    }

    fn args(&self, port: u16, database: &str, query: &str) -> Vec<String> {
        vec![
            "-h".to_string(),
            self.host.clone(),
            "-p".to_string(),
            port.to_string(),
            "-d".to_string(),
            database.to_string(),
            "-At".to_string(),
            "-F".to_string(),
            "|".to_string(),
            "-c".to_string(),
            query.to_string(),
        ]
    }

    async fn query(&self, port: u16, database: &str, query: &str) -> Result<String, ConnectionError> {
        let output = run_checked(self.executor.as_ref(), "psql", &self.args(port, database, query))
            .await
            .map_err(|e| ConnectionError::Database(e.to_string()))?;
        Ok(output.stdout)
    }
}

#[async_trait]
impl ClusterCatalog for PsqlCatalog {
    async fn segment_configuration(&self, port: u16) -> Result<Vec<SegConfig>, ConnectionError> {
        tracing::debug!("Querying segment configuration on {}:{}", self.host, port);

        let stdout = self.query(port, "template1", SEGMENT_CONFIGURATION_QUERY).await?;
        parse_segment_rows(&stdout).map_err(ConnectionError::Database)
    }

    async fn count_objects(&self, port: u16) -> Result<Vec<CountPerDb>, ConnectionError> {
        let names = self.query(port, "template1", DATABASE_NAMES_QUERY).await?;

        let mut counts = Vec::new();
        for db_name in names.lines().map(str::trim).filter(|name| !name.is_empty()) {
            tracing::debug!("Counting tables in database {}", db_name);
            let stdout = self.query(port, db_name, OBJECT_COUNT_QUERY).await?;
            let (ao_count, heap_count) =
                parse_count_row(&stdout).map_err(ConnectionError::Database)?;
            counts.push(CountPerDb {
                db_name: db_name.to_string(),
                ao_count,
                heap_count,
            });
        }
        Ok(counts)
    }
}

/// Parse the single `ao|heap` row of [`OBJECT_COUNT_QUERY`].
pub fn parse_count_row(output: &str) -> Result<(u64, u64), String> {
    let line = output.trim();
    let Some((ao, heap)) = line.split_once('|') else {
        return Err(format!("expected 2 columns in count row: {}", line));
    };
    let count = |value: &str| {
        value
            .parse()
            .map_err(|_| format!("invalid count {:?} in row: {}", value, line))
    };
    Ok((count(ao)?, count(heap)?))
}

/// Parse unaligned `psql` output with `|` separators into segments.
pub fn parse_segment_rows(output: &str) -> Result<Vec<SegConfig>, String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_segment_row)
        .collect()
}

fn parse_segment_row(line: &str) -> Result<SegConfig, String> {
    let fields: Vec<&str> = line.split('|').collect();
    let [content, dbid, hostname, port, datadir, role, preferred_role] = fields.as_slice() else {
        return Err(format!("expected 7 columns, got {}: {}", fields.len(), line));
    };

    let number_err = |name: &str, value: &str| format!("invalid {} {:?} in row: {}", name, value, line);
    let role_err = |value: &str| format!("unknown segment role {:?} in row: {}", value, line);

    Ok(SegConfig {
        content_id: content.parse().map_err(|_| number_err("content", content))?,
        db_id: dbid.parse().map_err(|_| number_err("dbid", dbid))?,
        hostname: hostname.to_string(),
        port: port.parse().map_err(|_| number_err("port", port))?,
        data_dir: PathBuf::from(datadir),
        role: SegmentRole::parse(role).ok_or_else(|| role_err(role))?,
        preferred_role: SegmentRole::parse(preferred_role).ok_or_else(|| role_err(preferred_role))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_master_and_primaries() {
        let rows = "-1|1|mdw|15432|/data/master/gpseg-1|p|p\n\
                    0|2|sdw1|25432|/data/primary/gpseg0|p|p\n";
        let segments = parse_segment_rows(rows).unwrap();

        assert_eq!(segments.len(), 2);
        assert!(segments[0].is_master());
        assert_eq!(segments[1].hostname, "sdw1");
        assert_eq!(segments[1].port, 25432);
        assert_eq!(segments[1].data_dir, PathBuf::from("/data/primary/gpseg0"));
    }

    #[test]
    fn rejects_short_rows() {
        let err = parse_segment_rows("-1|1|mdw").unwrap_err();
        assert!(err.contains("expected 7 columns"));
    }

    #[test]
    fn parses_count_row() {
        assert_eq!(parse_count_row("3|12\n").unwrap(), (3, 12));
    }

    #[test]
    fn rejects_count_row_without_separator() {
        let err = parse_count_row("15").unwrap_err();
        assert!(err.contains("expected 2 columns"));
    }

    #[test]
    fn rejects_negative_count() {
        let err = parse_count_row("-1|0").unwrap_err();
        assert!(err.contains("invalid count"));
    }

    #[test]
    fn rejects_bad_port() {
        let err = parse_segment_rows("0|2|sdw1|port|/data|p|p").unwrap_err();
        assert!(err.contains("invalid port"));
    }
}

// ABOUTME: Creates segment data directories on the agent's host.
// ABOUTME: Attempts every path and reports the ones that failed.

use std::path::PathBuf;

use crate::rpc::messages::DirFailure;

/// Create each directory in `datadirs`. Parents must already exist.
///
/// A path that is already a directory counts as created, so a failed step
/// can be rerun.
pub async fn create_segment_data_dirs(datadirs: &[PathBuf]) -> Vec<DirFailure> {
    let mut failures = Vec::new();

    for dir in datadirs {
        let mut builder = tokio::fs::DirBuilder::new();
        #[cfg(unix)]
        {
            builder.mode(0o755);
        }

        match builder.create(dir).await {
            Ok(()) => tracing::info!("Created data directory {}", dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => {
                tracing::info!("Data directory {} already exists", dir.display());
            }
            Err(e) => {
                tracing::error!("Failed to create data directory {}: {}", dir.display(), e);
                failures.push(DirFailure {
                    path: dir.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    failures
}

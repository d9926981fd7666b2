// ABOUTME: Host-local free port check used by the hub's port allocator.
// ABOUTME: Inspects active sockets via netstat; empty output means free.

use crate::exec::{CommandExecutor, ExecError, run_shell};

/// Shell pipeline printing every local port in `[start, end]` that has an
/// active connection or listener.
pub fn conflicting_ports_script(start: u32, end: u32) -> String {
    format!(
        "set -o pipefail; netstat -an | awk -v s={start} -v e={end} \
         '{{ n = split($4, parts, /[.:]/); p = parts[n]; \
         if (p ~ /^[0-9]+$/ && p + 0 >= s && p + 0 <= e) print p }}' | sort -un"
    )
}

/// Whether every port in `[base, base + num_primaries]` is unused on this host.
pub async fn check_free_ports(
    executor: &dyn CommandExecutor,
    base: u16,
    num_primaries: u16,
) -> Result<bool, ExecError> {
    let start = u32::from(base);
    let end = start + u32::from(num_primaries);

    tracing::info!("Checking port range from {} to {}", start, end);

    let output = run_shell(executor, &conflicting_ports_script(start, end)).await?;
    let conflicts = output.stdout.trim();

    if conflicts.is_empty() {
        tracing::info!("Port range is free");
        Ok(true)
    } else {
        tracing::info!("Port range is not free, in use: {}", conflicts.replace('\n', ","));
        Ok(false)
    }
}

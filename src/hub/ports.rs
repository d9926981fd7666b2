// ABOUTME: Port allocation for the target cluster.
// ABOUTME: Finds a port base free on every host and a free master port.

use async_trait::async_trait;
use rand::Rng;

use crate::agent::conflicting_ports_script;
use crate::error::{Error, Result};
use crate::exec::{CommandExecutor, run_shell};
use crate::rpc::messages::CheckFreePortsRequest;

use super::connection::AgentConnection;
use super::fanout::FanOut;

/// Port bases tried before giving up, seed included.
pub const MAX_PORT_BASE_ATTEMPTS: usize = 10;

/// Lowest port base the random fallback will pick.
pub const MIN_RANDOM_PORT_BASE: u16 = 1024;

/// Answers whether a port range is free everywhere it needs to be.
#[async_trait]
pub trait FreePortCheck: Send + Sync {
    /// True if `[base, base + num_primaries]` is free.
    async fn all_free(&self, base: u16, num_primaries: u16) -> bool;
}

/// Asks every agent about the range; free only if all of them say so.
pub struct AgentPortCheck<'a> {
    fanout: &'a FanOut,
    conns: &'a [AgentConnection],
}

impl<'a> AgentPortCheck<'a> {
    pub fn new(fanout: &'a FanOut, conns: &'a [AgentConnection]) -> Self {
        Self { fanout, conns }
    }
}

#[async_trait]
impl FreePortCheck for AgentPortCheck<'_> {
    async fn all_free(&self, base: u16, num_primaries: u16) -> bool {
        let req = CheckFreePortsRequest {
            possible_port_base: base,
            num_primaries,
        };
        self.fanout
            .all(self.conns, move |conn| async move {
                conn.client.check_free_ports(req).await.map(|reply| reply.result)
            })
            .await
    }
}

/// Refuses any range that would contain `reserved`, then defers to `inner`.
pub struct ReservedPortCheck<'a> {
    inner: &'a dyn FreePortCheck,
    reserved: u16,
}

impl<'a> ReservedPortCheck<'a> {
    pub fn new(inner: &'a dyn FreePortCheck, reserved: u16) -> Self {
        Self { inner, reserved }
    }
}

#[async_trait]
impl FreePortCheck for ReservedPortCheck<'_> {
    async fn all_free(&self, base: u16, num_primaries: u16) -> bool {
        let start = u32::from(base);
        let end = start + u32::from(num_primaries);
        if (start..=end).contains(&u32::from(self.reserved)) {
            tracing::info!("Port range {}-{} holds reserved port {}", start, end, self.reserved);
            return false;
        }
        self.inner.all_free(base, num_primaries).await
    }
}

/// Find a port base such that `[base, base + num_primaries]` is free.
///
/// The first candidate is one above the source cluster's highest port. Each
/// later candidate is drawn uniformly from the bases whose whole range fits
/// below 65536. At most [`MAX_PORT_BASE_ATTEMPTS`] candidates are checked.
pub async fn get_free_port_base<R>(
    max_port: u16,
    num_primaries: u16,
    check: &dyn FreePortCheck,
    rng: &mut R,
) -> Result<u16>
where
    R: Rng + Send,
{
    let highest_base = u16::MAX
        .checked_sub(num_primaries)
        .filter(|highest| *highest >= MIN_RANDOM_PORT_BASE)
        .ok_or_else(|| {
            Error::Config(format!(
                "no port range can hold {} primaries above {}",
                num_primaries, MIN_RANDOM_PORT_BASE
            ))
        })?;

    let mut candidate = match max_port.checked_add(1) {
        Some(seed) if seed <= highest_base => seed,
        _ => rng.gen_range(MIN_RANDOM_PORT_BASE..=highest_base),
    };

    for attempt in 1..=MAX_PORT_BASE_ATTEMPTS {
        if check.all_free(candidate, num_primaries).await {
            tracing::info!("Port base {} is free on all hosts", candidate);
            return Ok(candidate);
        }

        tracing::info!(
            "Port base {} is not free on all hosts (attempt {}/{})",
            candidate,
            attempt,
            MAX_PORT_BASE_ATTEMPTS
        );
        candidate = rng.gen_range(MIN_RANDOM_PORT_BASE..=highest_base);
    }

    Err(Error::PortAllocation {
        attempts: MAX_PORT_BASE_ATTEMPTS,
    })
}

/// Pick a port on the hub's host for the target cluster's master.
///
/// Prefers `known_port + 1`. If that is in use, or the check itself fails,
/// falls back to an ephemeral port handed out by the OS. The port is
/// released before returning, so another process could take it first.
pub async fn get_new_master_port(executor: &dyn CommandExecutor, known_port: u16) -> Result<u16> {
    if let Some(preferred) = known_port.checked_add(1) {
        let port = u32::from(preferred);
        match run_shell(executor, &conflicting_ports_script(port, port)).await {
            Ok(output) if output.stdout.trim().is_empty() => {
                tracing::info!("Using master port {}", preferred);
                return Ok(preferred);
            }
            Ok(_) => tracing::info!("Master port {} is in use", preferred),
            Err(e) => tracing::warn!("Unable to check master port {}: {}", preferred, e),
        }
    }

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Using ephemeral master port {}", port);
    Ok(port)
}

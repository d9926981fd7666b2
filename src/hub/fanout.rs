// ABOUTME: Concurrent fan-out of one call across every agent connection.
// ABOUTME: Reduces outcomes as an all-succeed predicate or an all-or-error action.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::rpc::ConnectionError;

use super::connection::AgentConnection;

/// The default number of agent calls in flight at once.
pub const DEFAULT_MAX_PARALLELISM: usize = 16;

/// A failed call against one agent.
#[derive(Debug, Clone)]
pub struct HostFailure {
    pub hostname: String,
    pub error: ConnectionError,
}

/// One or more agents failed an action.
///
/// Failures are kept in connection order; the first one is the reported
/// cause.
#[derive(Debug, Clone)]
pub struct FanOutError {
    pub failures: Vec<HostFailure>,
    pub total: usize,
}

impl FanOutError {
    pub fn first(&self) -> Option<&HostFailure> {
        self.failures.first()
    }
}

impl fmt::Display for FanOutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} agent(s) failed", self.failures.len(), self.total)?;
        if let Some(first) = self.first() {
            write!(f, ", first: {}: {}", first.hostname, first.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for FanOutError {}

/// Issues the same call to every connection in parallel.
///
/// Every connection is always called and every call is awaited before the
/// reduction runs, so one bad host never hides the state of the others.
/// At most `max_parallelism` calls are in flight at once.
#[derive(Debug, Clone)]
pub struct FanOut {
    max_parallelism: usize,
    call_timeout: Option<Duration>,
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARALLELISM)
    }
}

impl FanOut {
    pub fn new(max_parallelism: usize) -> Self {
        Self {
            max_parallelism: max_parallelism.max(1),
            call_timeout: None,
        }
    }

    /// Bound each individual call. A call that overruns becomes a
    /// [`ConnectionError::Timeout`] for that host only.
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// True only if every connection answered `Ok(true)`.
    ///
    /// An RPC error counts as `false` for that connection. An empty set is
    /// vacuously true.
    pub async fn all<F, Fut>(&self, conns: &[AgentConnection], call: F) -> bool
    where
        F: Fn(AgentConnection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, ConnectionError>> + Send + 'static,
    {
        let mut all_true = true;
        for (hostname, outcome) in self.run(conns, call).await {
            match outcome {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!("{} answered false", hostname);
                    all_true = false;
                }
                Err(e) => {
                    tracing::error!("{}: {}", hostname, e);
                    all_true = false;
                }
            }
        }
        all_true
    }

    /// Run a side-effecting call on every connection.
    ///
    /// The call is attempted everywhere even after a failure. Any failure
    /// makes the whole result an error.
    pub async fn each<F, Fut>(&self, conns: &[AgentConnection], call: F) -> Result<(), FanOutError>
    where
        F: Fn(AgentConnection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ConnectionError>> + Send + 'static,
    {
        let total = conns.len();
        let failures: Vec<HostFailure> = self
            .run(conns, call)
            .await
            .into_iter()
            .filter_map(|(hostname, outcome)| outcome.err().map(|error| HostFailure { hostname, error }))
            .collect();

        for failure in &failures {
            tracing::error!("{}: {}", failure.hostname, failure.error);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(FanOutError { failures, total })
        }
    }

    /// Spawn one task per connection and collect every outcome, in
    /// connection order.
    async fn run<T, F, Fut>(
        &self,
        conns: &[AgentConnection],
        call: F,
    ) -> Vec<(String, Result<T, ConnectionError>)>
    where
        T: Send + 'static,
        F: Fn(AgentConnection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ConnectionError>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_parallelism));
        let call = Arc::new(call);
        let mut set = JoinSet::new();
        let mut task_index = HashMap::with_capacity(conns.len());

        for (index, conn) in conns.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let call = Arc::clone(&call);
            let timeout = self.call_timeout;

            let handle = set.spawn(async move {
                // Hold onto the permit until the call finishes
                let _permit = semaphore.acquire_owned().await;
                let hostname = conn.hostname.clone();
                let result = match timeout {
                    Some(timeout) => match tokio::time::timeout(timeout, call(conn)).await {
                        Ok(result) => result,
                        Err(_) => Err(ConnectionError::Timeout {
                            addr: hostname,
                            timeout,
                        }),
                    },
                    None => call(conn).await,
                };
                (index, result)
            });
            task_index.insert(handle.id(), index);
        }

        let mut outcomes: Vec<Option<Result<T, ConnectionError>>> =
            (0..conns.len()).map(|_| None).collect();

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => outcomes[index] = Some(result),
                Err(e) => {
                    if let Some(&index) = task_index.get(&e.id()) {
                        outcomes[index] = Some(Err(ConnectionError::Request {
                            addr: conns[index].hostname.clone(),
                            reason: format!("agent call task failed: {}", e),
                        }));
                    }
                }
            }
        }

        conns
            .iter()
            .zip(outcomes)
            .map(|(conn, outcome)| {
                let outcome = outcome.unwrap_or_else(|| {
                    Err(ConnectionError::Request {
                        addr: conn.hostname.clone(),
                        reason: "agent call produced no result".to_string(),
                    })
                });
                (conn.hostname.clone(), outcome)
            })
            .collect()
    }
}

// ABOUTME: Errors from talking to a remote hub or agent.
// ABOUTME: Covers dialing, transport, remote failures, and timeouts.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    #[error("failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("request to {addr} failed: {reason}")]
    Request { addr: String, reason: String },

    #[error("{addr} responded {status}: {message}")]
    Remote {
        addr: String,
        status: u16,
        message: String,
    },

    #[error("invalid response from {addr}: {reason}")]
    Decode { addr: String, reason: String },

    #[error("no response from {addr} within {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("database query failed: {0}")]
    Database(String),
}

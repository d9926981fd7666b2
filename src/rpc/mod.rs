// ABOUTME: HTTP/JSON RPC between operator, hub, and agents.
// ABOUTME: Exports wire messages, the client helpers, and server plumbing.

pub mod client;
mod error;
mod hub_client;
pub mod messages;
pub mod server;

pub use error::ConnectionError;
pub use hub_client::HubClient;
pub use server::ApiError;

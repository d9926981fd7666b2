// ABOUTME: Library root for clusterup - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod agent;
pub mod checklist;
pub mod cluster;
pub mod config;
pub mod durable;
pub mod error;
pub mod exec;
pub mod hub;
pub mod output;
pub mod rpc;
pub mod types;

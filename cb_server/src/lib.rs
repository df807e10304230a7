//! HTTP server for the chess bracket engine.
//!
//! The binary in `main.rs` wires configuration, storage and the router
//! defined here; `cb_admin` reuses the same configuration for maintenance
//! commands.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;

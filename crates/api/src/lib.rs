//! HTTP API: server, routing, and request/response mapping.

pub mod app;
pub mod middleware;

/// Environment variable naming the listen address.
pub const BIND_ADDR: &str = "DRUMYARD_BIND_ADDR";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#![deny(missing_docs)]

//! Core library for the mem-dm tool server.

/// HTTP routing and tool handlers.
pub mod api;
/// Memory-service HTTP client: base URL resolution, retries, credential checks.
pub mod client;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Tool invocation counters.
pub mod metrics;
/// Tool service shared by every surface.
pub mod service;
/// Tool request shaping and response interpretation.
pub mod tools;

#[cfg(test)]
mod test_support;

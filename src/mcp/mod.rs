//! Model Context Protocol (MCP) integration for the mem-dm tools.
//!
//! The server exposes the memory tools over stdio so agent hosts can store and search memories
//! held by a remote memory service:
//!
//! - Tools: `mem_dm_add_memory`, `mem_dm_retrieve_memory`, and the `mem_dm` usage hint.
//! - Resources: `mcp://mem-dm/health` (base URL resolution and retry settings) and
//!   `mcp://mem-dm/metrics` (invocation counters).

mod format;
pub mod handlers;
mod registry;
mod schemas;
mod server;

pub use server::MemDmMcpServer;

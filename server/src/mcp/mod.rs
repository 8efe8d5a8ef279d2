//! MCP (Model Context Protocol) Server Module
//!
//! Exposes document search and agent memory to AI clients as MCP tools.
//!
//! ## Usage
//!
//! ```bash
//! recall-server --source-dir documents --storage-dir faiss_index
//! ```
//!
//! The MCP server communicates via stdio using JSON-RPC 2.0.

pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::*;
pub use server::{BackendConfig, McpBackend, McpServer};

//! Recall MCP Server Library
//!
//! Serves a document index and an agent memory store, both backed by
//! `recall-memory`, as Model Context Protocol tools over stdio.

pub mod error;
pub mod mcp;
pub mod memory;
pub mod numeric;

pub use error::{ServerError, ServerResult};
pub use mcp::{BackendConfig, McpBackend, McpServer};
pub use memory::{MemoryManager, StoredRecord};

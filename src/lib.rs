//! # Chainguard MCP Server
//!
//! Model Context Protocol (MCP) server exposing security advisory tools over
//! a standardized JSON-RPC 2.0 interface on stdio. No network port is opened;
//! the server speaks to exactly one client through stdin/stdout.
//!
//! ## Architecture
//!
//! - **Protocol Layer**: JSON-RPC 2.0 types, codec, and line-delimited stdio
//!   transport
//! - **Server Layer**: sequential request dispatch and the tool registry
//! - **Handler Layer**: advisory and session-memory tool handlers
//! - **Memory Layer**: optional per-session interaction cache, gated by
//!   `CHAINGUARD_MEMORY_ENABLED`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chainguard_mcp::{McpServer, ServerConfig, UnconfiguredClient};
//! use chainguard_mcp::server::tools;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::from_env();
//!     let registry = tools::default_registry()?;
//!
//!     let server = McpServer::new(config, registry, Arc::new(UnconfiguredClient));
//!     server.serve_stdio().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod advisory;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod protocol;
pub mod server;
pub mod upstream;

// Re-export main types
pub use advisory::AdvisoryDb;
pub use config::ServerConfig;
pub use context::{ServerContext, SessionContext};
pub use error::{Result, ServerError};
pub use memory::{Interaction, MemoryStore};
pub use protocol::{JsonRpcRequest, JsonRpcResponse, StdioTransport};
pub use server::{McpServer, ToolRegistry};
pub use upstream::{UnconfiguredClient, UpstreamClient, UpstreamError};

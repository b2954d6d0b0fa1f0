//! Error types for the MCP server

use crate::protocol::JsonRpcError;
use crate::upstream::UpstreamError;
use thiserror::Error;

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// MCP server errors
///
/// Everything hit while processing a single request is converted into an
/// error response for that request's id; only stream termination and startup
/// misconfiguration (`DuplicateTool`) are fatal to the process.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Protocol error (invalid JSON-RPC envelope)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Method not found
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Tool name not present in the registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Upstream data client failure
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Tool registered twice under the same name (startup-time, fatal)
    #[error("Duplicate tool registration: {0}")]
    DuplicateTool(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Convert to JSON-RPC error
    pub fn to_jsonrpc(&self) -> JsonRpcError {
        match self {
            ServerError::Protocol(msg) => JsonRpcError::invalid_request(msg),
            ServerError::MethodNotFound(method) => JsonRpcError::method_not_found(method),
            ServerError::UnknownTool(tool) => JsonRpcError::unknown_tool(tool),
            ServerError::InvalidParams(msg) => JsonRpcError::invalid_params(msg),
            ServerError::Upstream(e) => match e {
                UpstreamError::Unavailable(details) => {
                    JsonRpcError::upstream_unavailable(details)
                }
                UpstreamError::NotFound(id) => JsonRpcError::advisory_not_found(id),
                UpstreamError::Malformed(msg) => JsonRpcError::internal_error(msg),
            },
            // Never reaches the wire: registration happens before the loop
            ServerError::DuplicateTool(name) => {
                JsonRpcError::internal_error(format!("duplicate tool: {}", name))
            }
            ServerError::Io(e) => JsonRpcError::internal_error(e.to_string()),
            ServerError::Json(e) => JsonRpcError::internal_error(e.to_string()),
            ServerError::Internal(msg) => JsonRpcError::internal_error(msg),
        }
    }

    /// Create an invalid-parameters error for a missing field
    pub fn missing_param(name: &str) -> Self {
        ServerError::InvalidParams(format!("Missing '{}' parameter", name))
    }
}

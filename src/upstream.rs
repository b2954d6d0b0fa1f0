//! Upstream data client contract
//!
//! The server depends on its security-data backend only through this narrow
//! call/response seam. Timeout and retry policy belong to the implementation,
//! not the dispatch core.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure reported by the upstream data client
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Backend unreachable or not configured
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The queried entity does not exist upstream
    #[error("not found: {0}")]
    NotFound(String),

    /// Upstream answered with something the client could not interpret
    #[error("malformed upstream answer: {0}")]
    Malformed(String),
}

/// Narrow contract to whatever backend supplies security answers
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Answer one tool query
    async fn query(&self, tool: &str, params: &Value) -> Result<Value, UpstreamError>;
}

/// Upstream stand-in used when no advisory database is configured
///
/// Every query fails with `Unavailable`; the server still speaks protocol,
/// so a client can list tools and manage sessions.
pub struct UnconfiguredClient;

#[async_trait]
impl UpstreamClient for UnconfiguredClient {
    async fn query(&self, _tool: &str, _params: &Value) -> Result<Value, UpstreamError> {
        Err(UpstreamError::Unavailable(
            "no advisory database configured (set CHAINGUARD_ADVISORY_DB)".to_string(),
        ))
    }
}

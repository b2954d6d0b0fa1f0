//! Server and session contexts
//!
//! [`ServerContext`] lives for the process and gives tool handlers access to
//! the upstream data client and the session-memory store. [`SessionContext`]
//! is created by the dispatcher for one invocation and discarded afterwards.

use crate::memory::MemoryStore;
use crate::protocol::RequestId;
use crate::upstream::UpstreamClient;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Session key used when the caller does not name one
pub const DEFAULT_SESSION: &str = "default";

/// Process-lifetime state shared by all tool handlers
pub struct ServerContext {
    /// Upstream data client
    pub upstream: Arc<dyn UpstreamClient>,

    /// Session memory (inert when the feature flag is off)
    pub memory: MemoryStore,
}

impl ServerContext {
    /// Create a new server context
    pub fn new(upstream: Arc<dyn UpstreamClient>, memory: MemoryStore) -> Self {
        Self { upstream, memory }
    }
}

/// Per-invocation context handed to a tool handler
///
/// Not retained beyond the call. The session key comes from the call's
/// `arguments.session` field, falling back to [`DEFAULT_SESSION`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    request_id: RequestId,
    session_key: String,
    cancelled: Arc<AtomicBool>,
}

impl SessionContext {
    /// Build the context for one tool invocation
    pub fn new(request_id: RequestId, arguments: &Value) -> Self {
        let session_key = arguments
            .get("session")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SESSION)
            .to_string();

        Self {
            request_id,
            session_key,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Id of the request being served
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Session key for memory operations
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Cancellation flag for long-running handlers to poll
    ///
    /// Processing is strictly sequential, so the flag can only be set before
    /// the handler starts; there is no preemption of running handlers.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Mark the invocation as cancelled
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_key_from_arguments() {
        let ctx = SessionContext::new(RequestId::Number(1), &json!({"session": "review-42"}));
        assert_eq!(ctx.session_key(), "review-42");
    }

    #[test]
    fn test_session_key_defaults() {
        let ctx = SessionContext::new(RequestId::Number(1), &json!({"id": "CG-1"}));
        assert_eq!(ctx.session_key(), DEFAULT_SESSION);

        let ctx = SessionContext::new(RequestId::Number(2), &Value::Null);
        assert_eq!(ctx.session_key(), DEFAULT_SESSION);
    }

    #[test]
    fn test_cancellation_flag() {
        let ctx = SessionContext::new(RequestId::Number(1), &Value::Null);
        assert!(!ctx.is_cancelled());
        ctx.cancel();
        assert!(ctx.is_cancelled());
    }
}

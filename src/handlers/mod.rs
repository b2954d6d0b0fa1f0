//! Tool handlers
//!
//! Handlers receive the long-lived [`crate::ServerContext`], a per-call
//! [`crate::SessionContext`], and the call arguments; they return the tool
//! result or a [`crate::ServerError`] that the dispatcher converts into an
//! error response.

pub mod advisory_ops;
pub mod session_ops;

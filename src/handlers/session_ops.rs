//! Session memory handlers

use crate::context::{ServerContext, SessionContext};
use crate::error::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Handle the session_history tool
pub async fn session_history(
    ctx: Arc<ServerContext>,
    session: SessionContext,
    _args: Value,
) -> Result<Value> {
    let key = session.session_key();
    let interactions = ctx.memory.recall(key).await;

    info!(session = key, count = interactions.len(), "recalling session history");

    let count = interactions.len();
    Ok(json!({
        "session": key,
        "memory_enabled": ctx.memory.is_enabled(),
        "interactions": interactions,
        "count": count
    }))
}

/// Handle the session_clear tool
pub async fn session_clear(
    ctx: Arc<ServerContext>,
    session: SessionContext,
    _args: Value,
) -> Result<Value> {
    let key = session.session_key();
    let cleared = ctx.memory.clear(key).await;

    info!(session = key, cleared = cleared, "clearing session memory");

    Ok(json!({
        "session": key,
        "cleared": cleared
    }))
}

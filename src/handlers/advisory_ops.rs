//! Advisory query handlers
//!
//! Thin shims between the dispatcher and the upstream data client. After a
//! successful query each handler records an interaction into session memory;
//! with memory disabled the record is silently discarded.

use crate::context::{ServerContext, SessionContext};
use crate::error::{Result, ServerError};
use crate::memory::Interaction;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Handle the vuln_lookup tool
pub async fn vuln_lookup(
    ctx: Arc<ServerContext>,
    session: SessionContext,
    args: Value,
) -> Result<Value> {
    let id = args["id"]
        .as_str()
        .ok_or_else(|| ServerError::missing_param("id"))?;

    info!(advisory = id, session = session.session_key(), "looking up advisory");

    let advisory = ctx.upstream.query("vuln_lookup", &args).await?;

    ctx.memory
        .record(
            session.session_key(),
            Interaction::new("vuln_lookup", format!("looked up advisory {}", id)),
        )
        .await;

    Ok(json!({ "advisory": advisory }))
}

/// Handle the package_advisories tool
pub async fn package_advisories(
    ctx: Arc<ServerContext>,
    session: SessionContext,
    args: Value,
) -> Result<Value> {
    let package = args["package"]
        .as_str()
        .ok_or_else(|| ServerError::missing_param("package"))?;

    info!(package = package, "listing advisories for package");

    let result = ctx.upstream.query("package_advisories", &args).await?;

    let count = result["count"].as_u64().unwrap_or(0);
    ctx.memory
        .record(
            session.session_key(),
            Interaction::new(
                "package_advisories",
                format!("found {} advisories for {}", count, package),
            ),
        )
        .await;

    Ok(result)
}

/// Handle the version_check tool
pub async fn version_check(
    ctx: Arc<ServerContext>,
    session: SessionContext,
    args: Value,
) -> Result<Value> {
    let package = args["package"]
        .as_str()
        .ok_or_else(|| ServerError::missing_param("package"))?;
    let version = args["version"]
        .as_str()
        .ok_or_else(|| ServerError::missing_param("version"))?;

    info!(package = package, version = version, "checking version");

    let result = ctx.upstream.query("version_check", &args).await?;

    let affected = result["affected"].as_bool().unwrap_or(false);
    ctx.memory
        .record(
            session.session_key(),
            Interaction::new(
                "version_check",
                format!(
                    "{} {} is {}",
                    package,
                    version,
                    if affected { "affected" } else { "clean" }
                ),
            ),
        )
        .await;

    Ok(result)
}

//! Server configuration
//!
//! Environment state is resolved exactly once at startup into an explicit
//! [`ServerConfig`]; nothing re-reads the environment afterwards.

use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Feature flag controlling the session-memory store
pub const MEMORY_ENV: &str = "CHAINGUARD_MEMORY_ENABLED";

/// Path to the advisory database file
pub const ADVISORY_DB_ENV: &str = "CHAINGUARD_ADVISORY_DB";

/// MCP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server name
    pub name: String,

    /// Server version
    pub version: String,

    /// Whether the session-memory store is active
    pub memory_enabled: bool,

    /// Advisory database file, if configured
    pub advisory_db: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "chainguard-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            memory_enabled: false,
            advisory_db: None,
        }
    }
}

impl ServerConfig {
    /// Build configuration from the process environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.memory_enabled = parse_memory_flag(env::var(MEMORY_ENV).ok().as_deref());
        config.advisory_db = env::var_os(ADVISORY_DB_ENV).map(PathBuf::from);
        config
    }
}

/// Parse the memory feature flag: `true`/`false`, case-insensitive,
/// default `false`. Unrecognized values keep the default.
fn parse_memory_flag(raw: Option<&str>) -> bool {
    match raw {
        None => false,
        Some(v) if v.eq_ignore_ascii_case("true") => true,
        Some(v) if v.eq_ignore_ascii_case("false") => false,
        Some(other) => {
            warn!(
                value = other,
                "unrecognized {} value, memory stays disabled", MEMORY_ENV
            );
            false
        }
    }
}

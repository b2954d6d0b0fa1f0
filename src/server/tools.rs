//! Tool definitions
//!
//! Builds the fixed tool set at startup: advisory queries plus the session
//! memory tools. Schemas are declared inline as JSON Schema literals.

use super::registry::{ToolDescriptor, ToolRegistry};
use crate::error::Result;
use crate::handlers::{advisory_ops, session_ops};
use serde_json::json;

/// Build the registry holding every tool this server exposes
pub fn default_registry() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    registry.register(tool_vuln_lookup())?;
    registry.register(tool_package_advisories())?;
    registry.register(tool_version_check())?;
    registry.register(tool_session_history())?;
    registry.register(tool_session_clear())?;

    Ok(registry)
}

fn tool_vuln_lookup() -> ToolDescriptor {
    ToolDescriptor {
        name: "vuln_lookup".to_string(),
        description: "Look up a single security advisory by its identifier.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Advisory identifier (e.g. 'CG-2024-0001')",
                    "minLength": 1
                },
                "session": {
                    "type": "string",
                    "description": "Session key for conversational memory"
                }
            },
            "required": ["id"]
        }),
        output_schema: json!({
            "type": "object",
            "properties": {
                "advisory": {"type": "object"}
            }
        }),
        handler: |ctx, session, args| Box::pin(advisory_ops::vuln_lookup(ctx, session, args)),
    }
}

fn tool_package_advisories() -> ToolDescriptor {
    ToolDescriptor {
        name: "package_advisories".to_string(),
        description: "List security advisories affecting a package, optionally filtered by minimum severity.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "package": {
                    "type": "string",
                    "description": "Package name (e.g. 'openssl')",
                    "minLength": 1
                },
                "severity": {
                    "type": "string",
                    "description": "Minimum severity to include",
                    "enum": ["low", "medium", "high", "critical"]
                },
                "session": {
                    "type": "string",
                    "description": "Session key for conversational memory"
                }
            },
            "required": ["package"]
        }),
        output_schema: json!({
            "type": "object",
            "properties": {
                "package": {"type": "string"},
                "advisories": {"type": "array"},
                "count": {"type": "integer"}
            }
        }),
        handler: |ctx, session, args| {
            Box::pin(advisory_ops::package_advisories(ctx, session, args))
        },
    }
}

fn tool_version_check() -> ToolDescriptor {
    ToolDescriptor {
        name: "version_check".to_string(),
        description: "Check whether a specific package version is affected by any known advisory.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "package": {
                    "type": "string",
                    "description": "Package name"
                },
                "version": {
                    "type": "string",
                    "description": "Version to check (e.g. '3.0.4')"
                },
                "session": {
                    "type": "string",
                    "description": "Session key for conversational memory"
                }
            },
            "required": ["package", "version"]
        }),
        output_schema: json!({
            "type": "object",
            "properties": {
                "affected": {"type": "boolean"},
                "advisories": {"type": "array", "items": {"type": "string"}}
            }
        }),
        handler: |ctx, session, args| Box::pin(advisory_ops::version_check(ctx, session, args)),
    }
}

fn tool_session_history() -> ToolDescriptor {
    ToolDescriptor {
        name: "session_history".to_string(),
        description: "Return the interactions recorded for a session. Empty when session memory is disabled.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session": {
                    "type": "string",
                    "description": "Session key (default: 'default')"
                }
            }
        }),
        output_schema: json!({
            "type": "object",
            "properties": {
                "interactions": {"type": "array"},
                "memory_enabled": {"type": "boolean"},
                "count": {"type": "integer"}
            }
        }),
        handler: |ctx, session, args| Box::pin(session_ops::session_history(ctx, session, args)),
    }
}

fn tool_session_clear() -> ToolDescriptor {
    ToolDescriptor {
        name: "session_clear".to_string(),
        description: "Evict all recorded interactions for a session.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session": {
                    "type": "string",
                    "description": "Session key (default: 'default')"
                }
            }
        }),
        output_schema: json!({
            "type": "object",
            "properties": {
                "cleared": {"type": "boolean"}
            }
        }),
        handler: |ctx, session, args| Box::pin(session_ops::session_clear(ctx, session, args)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_contents() {
        let registry = default_registry().unwrap();

        assert_eq!(registry.len(), 5);
        assert!(registry.lookup("vuln_lookup").is_some());
        assert!(registry.lookup("package_advisories").is_some());
        assert!(registry.lookup("version_check").is_some());
        assert!(registry.lookup("session_history").is_some());
        assert!(registry.lookup("session_clear").is_some());
    }

    #[test]
    fn test_schemas_declare_required_fields() {
        let registry = default_registry().unwrap();

        let lookup = registry.lookup("vuln_lookup").unwrap();
        assert_eq!(lookup.input_schema["required"][0], "id");

        let check = registry.lookup("version_check").unwrap();
        let required = check.input_schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 2);
    }
}

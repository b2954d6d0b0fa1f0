//! Tool registry
//!
//! Fixed mapping from tool name to descriptor, built once at startup.
//! Dispatch is an exact key lookup over tagged descriptors; no reflection.
//! The registry is never mutated after startup, so the dispatcher reads it
//! without locking.

use crate::context::{ServerContext, SessionContext};
use crate::error::{Result, ServerError};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by a tool handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'static>>;

/// Tool handler entry point
///
/// A plain function pointer; async handler bodies are wrapped by
/// non-capturing closures at registration.
pub type ToolHandler = fn(Arc<ServerContext>, SessionContext, Value) -> HandlerFuture;

/// One callable tool: name, schemas, and handler
///
/// Immutable after registry construction.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    /// Tool name (unique registry key)
    pub name: String,

    /// Tool description
    pub description: String,

    /// Declared input schema (JSON Schema)
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,

    /// Declared output schema (JSON Schema)
    #[serde(rename = "outputSchema")]
    pub output_schema: Value,

    /// Handler entry point
    #[serde(skip_serializing)]
    pub handler: ToolHandler,
}

impl ToolDescriptor {
    /// Check the call arguments against the declared input schema's
    /// `required` list. Deeper validation belongs to the handler.
    pub fn validate_args(&self, args: &Value) -> Result<()> {
        let Some(required) = self.input_schema.get("required").and_then(Value::as_array) else {
            return Ok(());
        };

        if required.is_empty() {
            return Ok(());
        }

        if !args.is_object() {
            return Err(ServerError::InvalidParams(format!(
                "tool '{}' expects an arguments object",
                self.name
            )));
        }

        for field in required {
            let Some(field) = field.as_str() else {
                continue;
            };
            if args.get(field).is_none() {
                return Err(ServerError::missing_param(field));
            }
        }

        Ok(())
    }
}

/// Registry of all tools exposed by the server
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; fails if the name is already taken.
    ///
    /// Called only during startup, before the dispatch loop runs.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<()> {
        if self.index.contains_key(&descriptor.name) {
            return Err(ServerError::DuplicateTool(descriptor.name));
        }

        self.index
            .insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(descriptor);
        Ok(())
    }

    /// Look up a tool by exact name
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&idx| &self.tools[idx])
    }

    /// All descriptors in registration order
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

//! JSON-RPC 2.0 protocol types and codec
//!
//! Implementation of JSON-RPC 2.0 specification for MCP communication.
//! A request without an id is a notification and never receives a response.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version (must be "2.0")
    pub jsonrpc: String,

    /// Request ID (absent for notifications)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,

    /// Method name
    pub method: String,

    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// Create a notification (request without ID)
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }

    /// Check if this is a notification
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version (must be "2.0")
    pub jsonrpc: String,

    /// Request ID (same as request, or null when the id could not be
    /// recovered from a malformed payload)
    pub id: Option<RequestId>,

    /// Result (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,

    /// Error message
    pub message: String,

    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new error
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error with additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    // Standard JSON-RPC 2.0 errors

    /// Parse error (-32700): Invalid JSON
    pub fn parse_error() -> Self {
        Self::new(-32700, "Parse error")
    }

    /// Invalid request (-32600): Not a valid request object
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(-32600, format!("Invalid request: {}", msg.into()))
    }

    /// Method not found (-32601): Method does not exist
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(-32601, format!("Method not found: {}", method.into()))
    }

    /// Invalid params (-32602): Invalid method parameters
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(-32602, format!("Invalid params: {}", msg.into()))
    }

    /// Internal error (-32603): Internal JSON-RPC error
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(-32603, format!("Internal error: {}", msg.into()))
    }

    // Custom server errors (-32000 to -32099)

    /// Upstream data source unavailable (-32001)
    pub fn upstream_unavailable(details: impl Into<String>) -> Self {
        Self::with_data(
            -32001,
            "Upstream data source unavailable",
            serde_json::json!({"details": details.into()}),
        )
    }

    /// Unknown tool (-32002)
    pub fn unknown_tool(tool: impl Into<String>) -> Self {
        Self::with_data(
            -32002,
            "Unknown tool",
            serde_json::json!({"tool": tool.into()}),
        )
    }

    /// Advisory not found (-32003)
    pub fn advisory_not_found(id: impl Into<String>) -> Self {
        Self::with_data(
            -32003,
            "Advisory not found",
            serde_json::json!({"advisory": id.into()}),
        )
    }
}

/// Request/Response ID (can be string or number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String ID
    String(String),
    /// Numeric ID
    Number(i64),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// What went wrong while decoding a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The payload was not valid JSON
    Parse,
    /// Valid JSON, but not a valid JSON-RPC request envelope
    Envelope,
}

/// Decode failure for one frame
///
/// Carries whatever request id could be recovered from the raw payload so the
/// dispatcher can correlate its error response. Decode failures are
/// recoverable; the stream stays open.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DecodeError {
    /// Id recovered from the malformed payload, if any
    pub id: Option<RequestId>,
    /// Failure classification
    pub kind: DecodeErrorKind,
    /// Human-readable description
    pub message: String,
}

impl DecodeError {
    /// Convert to the matching protocol-level error object
    pub fn to_jsonrpc(&self) -> JsonRpcError {
        match self.kind {
            DecodeErrorKind::Parse => JsonRpcError::parse_error(),
            DecodeErrorKind::Envelope => JsonRpcError::invalid_request(self.message.clone()),
        }
    }
}

/// Decode one frame into a request, validating the envelope.
///
/// On failure the returned error carries any id that could be pulled out of
/// the raw payload, so the caller can still answer the right request.
pub fn decode_request(raw: &str) -> Result<JsonRpcRequest, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| DecodeError {
        id: None,
        kind: DecodeErrorKind::Parse,
        message: format!("invalid JSON: {}", e),
    })?;

    // Best-effort id recovery for envelope errors
    let id = value
        .get("id")
        .cloned()
        .and_then(|v| serde_json::from_value::<RequestId>(v).ok());

    let request: JsonRpcRequest =
        serde_json::from_value(value).map_err(|e| DecodeError {
            id: id.clone(),
            kind: DecodeErrorKind::Envelope,
            message: format!("not a JSON-RPC request: {}", e),
        })?;

    if request.jsonrpc != "2.0" {
        return Err(DecodeError {
            id,
            kind: DecodeErrorKind::Envelope,
            message: format!("unsupported jsonrpc version: {:?}", request.jsonrpc),
        });
    }

    if request.method.is_empty() {
        return Err(DecodeError {
            id,
            kind: DecodeErrorKind::Envelope,
            message: "empty method name".to_string(),
        });
    }

    Ok(request)
}

/// Encode a response as one wire frame (without the trailing newline).
pub fn encode_response(response: &JsonRpcResponse) -> serde_json::Result<String> {
    serde_json::to_string(response)
}

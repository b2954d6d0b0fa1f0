//! MCP server implementation
//!
//! The dispatch loop: reads one framed message at a time, routes it to a
//! built-in protocol method or a registered tool, and writes exactly one
//! response per request. Processing is strictly sequential; one message is
//! fully handled before the next read begins, so responses can never be
//! emitted out of order.
//!
//! The loop moves through `AwaitingRequest -> Processing -> Responding` per
//! message and enters the terminal `Closed` state on end-of-stream or an
//! explicit `shutdown` request. A failed call never ends the session; only
//! transport closure does.

pub mod registry;
pub mod tools;

use crate::config::ServerConfig;
use crate::context::{ServerContext, SessionContext};
use crate::error::{Result, ServerError};
use crate::protocol::{
    decode_request, encode_response, JsonRpcRequest, JsonRpcResponse, RequestId, StdioTransport,
    Transport,
};
use crate::upstream::UpstreamClient;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{info, warn};

pub use registry::{HandlerFuture, ToolDescriptor, ToolHandler, ToolRegistry};

/// MCP protocol revision this server implements
const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP server
pub struct McpServer {
    config: ServerConfig,
    registry: ToolRegistry,
    context: Arc<ServerContext>,
    shutting_down: AtomicBool,
}

impl McpServer {
    /// Create a new MCP server
    ///
    /// The memory store is constructed here from the already-resolved
    /// feature flag; nothing downstream re-reads the environment.
    pub fn new(
        config: ServerConfig,
        registry: ToolRegistry,
        upstream: Arc<dyn UpstreamClient>,
    ) -> Self {
        let memory = crate::memory::MemoryStore::new(config.memory_enabled);
        let context = Arc::new(ServerContext::new(upstream, memory));

        info!(
            server = config.name,
            version = config.version,
            memory_enabled = config.memory_enabled,
            tools = registry.len(),
            "MCP server initialized"
        );

        Self {
            config,
            registry,
            context,
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Serve requests over stdio until the peer disconnects
    pub async fn serve_stdio(&self) -> Result<()> {
        info!("MCP server listening on stdio");
        self.serve(StdioTransport::stdio()).await
    }

    /// Serve requests over an arbitrary transport
    pub async fn serve<R, W>(&self, mut transport: Transport<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            // AwaitingRequest
            let frame = match transport.read_frame().await? {
                Some(frame) => frame,
                None => {
                    // EOF - client disconnected; Closed is terminal
                    info!("Client disconnected");
                    break;
                }
            };

            // Processing
            let request = match decode_request(&frame) {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "Malformed frame");
                    // Answer with whatever id could be recovered; the
                    // stream stays open.
                    let response = JsonRpcResponse::error(e.id.clone(), e.to_jsonrpc());
                    transport.write_frame(&encode_response(&response)?).await?;
                    continue;
                }
            };

            // Notifications never produce a response, even on failure
            if request.is_notification() {
                self.handle_notification(&request).await;
                continue;
            }

            let response = self.handle_request(request).await;

            // Responding
            transport.write_frame(&encode_response(&response)?).await?;

            if self.shutting_down.load(Ordering::SeqCst) {
                info!("Shutdown requested by peer");
                break;
            }
        }

        transport.close().await?;
        Ok(())
    }

    /// Handle a JSON-RPC request, producing exactly one response
    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        // Notifications are routed before this point
        let Some(id) = request.id.clone() else {
            return JsonRpcResponse::error(
                None,
                ServerError::Protocol("request without id".to_string()).to_jsonrpc(),
            );
        };

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "tools/list" => self.handle_tools_list().await,
            "tools/call" => self.handle_tool_call(&id, request.params).await,
            "ping" => Ok(json!({})),
            "shutdown" => self.handle_shutdown(),
            _ => Err(ServerError::MethodNotFound(request.method.clone())),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                warn!(error = %e, method = %request.method, "Request failed");
                JsonRpcResponse::error(Some(id), e.to_jsonrpc())
            }
        }
    }

    /// Handle a notification; failures are logged, never answered
    async fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => {
                info!("Client finished initialization");
            }
            "notifications/cancelled" => {
                // Processing is sequential, so there is never an in-flight
                // request when a cancellation is read.
                info!(params = ?request.params, "Cancellation received with nothing in flight");
            }
            other => {
                warn!(method = other, "Ignoring unknown notification");
            }
        }
    }

    /// Handle initialize request
    async fn handle_initialize(&self, params: Option<Value>) -> Result<Value> {
        info!(?params, "Received initialize request");

        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": self.config.name,
                "version": self.config.version
            },
            "sessionMemory": {
                "enabled": self.config.memory_enabled
            }
        }))
    }

    /// Handle tools/list request
    async fn handle_tools_list(&self) -> Result<Value> {
        Ok(json!({
            "tools": self.registry.descriptors()
        }))
    }

    /// Handle tools/call request
    async fn handle_tool_call(&self, id: &RequestId, params: Option<Value>) -> Result<Value> {
        let params =
            params.ok_or_else(|| ServerError::InvalidParams("Missing parameters".to_string()))?;

        let tool_name = params["name"]
            .as_str()
            .ok_or_else(|| ServerError::InvalidParams("Missing tool name".to_string()))?;

        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        info!(tool = tool_name, "Calling tool");

        let descriptor = self
            .registry
            .lookup(tool_name)
            .ok_or_else(|| ServerError::UnknownTool(tool_name.to_string()))?;

        descriptor.validate_args(&arguments)?;

        let session = SessionContext::new(id.clone(), &arguments);
        (descriptor.handler)(self.context.clone(), session, arguments).await
    }

    /// Handle shutdown: acknowledge, then leave the loop after responding
    fn handle_shutdown(&self) -> Result<Value> {
        self.shutting_down.store(true, Ordering::SeqCst);
        Ok(json!({}))
    }
}

#[cfg(test)]
mod server_tests {
    use super::*;
    use crate::advisory::{Advisory, AdvisoryDb, Severity, VersionRange};
    use tokio::io::BufReader;

    fn sample_upstream() -> Arc<AdvisoryDb> {
        Arc::new(AdvisoryDb::from_advisories(vec![Advisory {
            id: "CG-2024-0001".to_string(),
            package: "openssl".to_string(),
            summary: "Buffer over-read in handshake parsing".to_string(),
            severity: Severity::High,
            affected: vec![VersionRange {
                introduced: Some("3.0.0".to_string()),
                fixed: Some("3.0.12".to_string()),
            }],
            references: vec![],
        }]))
    }

    fn test_server(memory_enabled: bool) -> McpServer {
        let config = ServerConfig {
            memory_enabled,
            ..ServerConfig::default()
        };
        let registry = tools::default_registry().unwrap();
        McpServer::new(config, registry, sample_upstream())
    }

    /// Drive the server with a scripted input stream; returns parsed output
    /// frames in write order.
    async fn run(server: &McpServer, input: &str) -> Vec<Value> {
        let mut out: Vec<u8> = Vec::new();
        {
            let transport = Transport::new(BufReader::new(input.as_bytes()), &mut out);
            server.serve(transport).await.unwrap();
        }

        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_tools_list_reports_all_tools() {
        // Scenario A
        let server = test_server(false);
        let output = run(&server, "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n").await;

        assert_eq!(output.len(), 1);
        assert_eq!(output[0]["id"], 1);

        let names: Vec<&str> = output[0]["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "vuln_lookup",
                "package_advisories",
                "version_check",
                "session_history",
                "session_clear"
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_answered_and_loop_survives() {
        // Scenario B, plus the stream staying open for the next request
        let server = test_server(false);
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"unknown\"}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n",
        );
        let output = run(&server, input).await;

        assert_eq!(output.len(), 2);
        assert_eq!(output[0]["id"], 2);
        assert_eq!(output[0]["error"]["code"], -32002);
        assert_eq!(output[0]["error"]["data"]["tool"], "unknown");
        assert_eq!(output[1]["id"], 3);
        assert!(output[1]["result"].is_object());
    }

    #[tokio::test]
    async fn test_memory_disabled_recall_is_empty() {
        // Scenario C: two calls sharing a session key, memory off
        let server = test_server(false);
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"vuln_lookup\",\"arguments\":{\"id\":\"CG-2024-0001\",\"session\":\"s\"}}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"session_history\",\"arguments\":{\"session\":\"s\"}}}\n",
        );
        let output = run(&server, input).await;

        assert_eq!(output.len(), 2);
        assert!(output[0]["result"]["advisory"].is_object());
        assert_eq!(output[1]["result"]["count"], 0);
        assert_eq!(output[1]["result"]["memory_enabled"], false);
    }

    #[tokio::test]
    async fn test_memory_enabled_recall_returns_context() {
        let server = test_server(true);
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"vuln_lookup\",\"arguments\":{\"id\":\"CG-2024-0001\",\"session\":\"s\"}}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"session_history\",\"arguments\":{\"session\":\"s\"}}}\n",
        );
        let output = run(&server, input).await;

        assert_eq!(output[1]["result"]["count"], 1);
        assert_eq!(
            output[1]["result"]["interactions"][0]["tool"],
            "vuln_lookup"
        );
    }

    #[tokio::test]
    async fn test_eof_closes_cleanly_without_writes() {
        // Scenario D: end-of-stream mid-session
        let server = test_server(false);
        let output = run(&server, "").await;
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_exactly_one_response_per_request() {
        let server = test_server(false);
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":10,\"method\":\"ping\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":11,\"method\":\"ping\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":12,\"method\":\"no_such_method\"}\n",
        );
        let output = run(&server, input).await;

        assert_eq!(output.len(), 3);
        assert_eq!(output[0]["id"], 10);
        assert_eq!(output[1]["id"], 11);
        assert_eq!(output[2]["id"], 12);
        assert_eq!(output[2]["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_malformed_frame_answered_with_recovered_id() {
        let server = test_server(false);
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":5,\"method\":42}\n",
            "not json at all\n",
            "{\"jsonrpc\":\"2.0\",\"id\":6,\"method\":\"ping\"}\n",
        );
        let output = run(&server, input).await;

        assert_eq!(output.len(), 3);
        // Envelope error: id was recoverable
        assert_eq!(output[0]["id"], 5);
        assert_eq!(output[0]["error"]["code"], -32600);
        // Parse error: no id to recover
        assert!(output[1]["id"].is_null());
        assert_eq!(output[1]["error"]["code"], -32700);
        // Loop stayed open
        assert_eq!(output[2]["id"], 6);
    }

    #[tokio::test]
    async fn test_notifications_are_silent() {
        let server = test_server(false);
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/cancelled\",\"params\":{\"requestId\":1}}\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"some/unknown\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
        );
        let output = run(&server, input).await;

        // Only the ping is answered
        assert_eq!(output.len(), 1);
        assert_eq!(output[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_invalid_params_rejected_by_schema() {
        let server = test_server(false);
        let input =
            "{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"tools/call\",\"params\":{\"name\":\"vuln_lookup\",\"arguments\":{}}}\n";
        let output = run(&server, input).await;

        assert_eq!(output.len(), 1);
        assert_eq!(output[0]["id"], 4);
        assert_eq!(output[0]["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_shutdown_ends_loop_after_response() {
        let server = test_server(false);
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"shutdown\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
        );
        let output = run(&server, input).await;

        // The second request is never read
        assert_eq!(output.len(), 1);
        assert_eq!(output[0]["id"], 1);
        assert!(output[0]["result"].is_object());
    }

    #[tokio::test]
    async fn test_initialize_reports_capabilities() {
        let server = test_server(true);
        let output = run(
            &server,
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n",
        )
        .await;

        let result = &output[0]["result"];
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "chainguard-mcp");
        assert_eq!(result["sessionMemory"]["enabled"], true);
    }

    #[tokio::test]
    async fn test_upstream_failure_does_not_kill_session() {
        let server = {
            let config = ServerConfig::default();
            let registry = tools::default_registry().unwrap();
            McpServer::new(
                config,
                registry,
                Arc::new(crate::upstream::UnconfiguredClient),
            )
        };
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"vuln_lookup\",\"arguments\":{\"id\":\"CG-1\"}}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
        );
        let output = run(&server, input).await;

        assert_eq!(output.len(), 2);
        assert_eq!(output[0]["error"]["code"], -32001);
        assert_eq!(output[1]["id"], 2);
    }
}

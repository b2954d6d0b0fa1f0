//! MCP protocol implementation
//!
//! Core protocol types, codec, and transport for Model Context Protocol
//! communication using JSON-RPC 2.0 over line-delimited stdio.

pub mod jsonrpc;
pub mod transport;

pub use jsonrpc::{
    decode_request, encode_response, DecodeError, DecodeErrorKind, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};
pub use transport::{StdioTransport, Transport};

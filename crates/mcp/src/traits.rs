//! Transport abstraction so the client is independent of how bytes move.

use {async_trait::async_trait, serde_json::Value};

use crate::{error::Result, types::JsonRpcResponse};

/// Transport layer for MCP communication (JSON-RPC).
///
/// `StdioTransport` implements this over stdin/stdout of a child process,
/// `HttpTransport` over streamable HTTP.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Send a JSON-RPC request and wait for the matching response.
    ///
    /// An RPC-level error object is returned as
    /// [`ProtocolError::Rpc`](crate::error::ProtocolError::Rpc).
    async fn request(&self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse>;

    /// Send a JSON-RPC notification (no response expected).
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()>;

    /// Release the underlying process or session.
    async fn close(&self);
}

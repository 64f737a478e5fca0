//! MCP (Model Context Protocol) client support for mentionbot.
//!
//! This crate provides:
//! - JSON-RPC 2.0 over stdio (`transport`) and streamable HTTP (`http_transport`)
//! - MCP client for the protocol handshake and tool interactions (`client`)
//! - Upstream descriptions and one-session-per-call helpers (`target`, `client`)

pub mod client;
pub mod describe;
pub mod error;
pub mod http_transport;
pub mod target;
pub mod traits;
pub mod transport;
pub mod types;

pub use {
    client::{McpClient, call_once, fetch_tools},
    describe::describe_with_schema,
    error::{Error, FailureKind, McpTransportError, ProtocolError, Result},
    http_transport::HttpTransport,
    target::{Endpoint, UpstreamTarget},
    traits::McpTransport,
    transport::StdioTransport,
    types::{Arguments, McpToolDef, ToolContent, ToolsCallResult},
};

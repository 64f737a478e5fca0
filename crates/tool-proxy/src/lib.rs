//! MCP tool gateway.
//!
//! Republishes the tool catalog of an upstream MCP server on a stateless
//! JSON-RPC HTTP endpoint and forwards every `tools/call` through a fresh
//! upstream session. The same server hosts local tools through
//! [`ToolProvider`].

pub mod error;
pub mod forwarder;
pub mod provider;
pub mod registry;
pub mod server;

pub use {
    error::{Error, Result},
    forwarder::UpstreamForwarder,
    provider::ToolProvider,
    registry::CapabilityRegistry,
    server::{build_router, serve},
};

//! Gateway tool provider: a frozen catalog plus per-call upstream sessions.

use std::sync::Arc;

use {
    async_trait::async_trait,
    mentionbot_mcp::{Arguments, McpToolDef, ToolsCallResult, UpstreamTarget, call_once, fetch_tools},
    tracing::{info, warn},
};

use crate::{error::Result, provider::ToolProvider, registry::CapabilityRegistry};

/// Forwards every call to the upstream through a brand-new session, so no
/// state survives between calls and any replica can serve any call.
pub struct UpstreamForwarder {
    registry: Arc<CapabilityRegistry>,
    target: UpstreamTarget,
}

impl UpstreamForwarder {
    /// Discover the upstream catalog once. Failure here is fatal for the
    /// gateway.
    pub async fn discover(target: UpstreamTarget) -> Result<Self> {
        let tools = fetch_tools(&target).await?;
        let registry = CapabilityRegistry::from_tools(tools);
        info!(upstream = %target, tools = registry.len(), "upstream catalog frozen");
        Ok(Self::new(Arc::new(registry), target))
    }

    pub fn new(registry: Arc<CapabilityRegistry>, target: UpstreamTarget) -> Self {
        Self { registry, target }
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }
}

#[async_trait]
impl ToolProvider for UpstreamForwarder {
    fn tools(&self) -> &[McpToolDef] {
        self.registry.tools()
    }

    async fn call(&self, name: &str, arguments: Arguments) -> ToolsCallResult {
        match call_once(&self.target, name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(upstream = %self.target, tool = name, kind = ?e.kind(), error = %e, "forward failed");
                ToolsCallResult::error(format!("upstream call to '{name}' failed: {e}"))
            },
        }
    }
}

use {
    async_trait::async_trait,
    mentionbot_mcp::{Arguments, McpToolDef, ToolsCallResult},
};

/// A set of tools served by the JSON-RPC endpoint.
///
/// `call` is only invoked for names present in `tools()`. Failures are
/// reported inside the result (`isError`), never as a protocol error.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    fn tools(&self) -> &[McpToolDef];

    async fn call(&self, name: &str, arguments: Arguments) -> ToolsCallResult;

    fn has_tool(&self, name: &str) -> bool {
        self.tools().iter().any(|t| t.name == name)
    }
}

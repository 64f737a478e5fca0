//! MCP client: protocol handshake and tool interactions with a single server.

use tracing::{debug, info, warn};

use crate::{
    error::{ProtocolError, Result},
    target::UpstreamTarget,
    traits::McpTransport,
    types::{
        Arguments, ClientCapabilities, Implementation, InitializeParams, InitializeResult,
        McpToolDef, PROTOCOL_VERSION, ToolsCallParams, ToolsCallResult, ToolsListResult,
        is_supported_version,
    },
};

/// Upper bound on `tools/list` pages, in case a server keeps handing out
/// cursors.
const MAX_LIST_PAGES: usize = 64;

/// An initialized MCP session.
///
/// The session owns its transport. Dropping the client releases it (the
/// child process is killed); [`McpClient::close`] does the same and also ends
/// an HTTP session politely.
pub struct McpClient {
    label: String,
    transport: Box<dyn McpTransport>,
    server_info: InitializeResult,
}

impl McpClient {
    /// Open a transport to `target` and perform the handshake.
    pub async fn connect(target: &UpstreamTarget) -> Result<Self> {
        info!(upstream = %target, "connecting to MCP server");
        let transport = target.open()?;
        Self::handshake(target.to_string(), transport, target.client_info.clone()).await
    }

    /// Perform the handshake over an already open transport.
    pub async fn handshake(
        label: String,
        transport: Box<dyn McpTransport>,
        client_info: Implementation,
    ) -> Result<Self> {
        match initialize(transport.as_ref(), client_info).await {
            Ok(server_info) => {
                info!(
                    upstream = %label,
                    protocol = %server_info.protocol_version,
                    server_name = %server_info.server_info.name,
                    "MCP server initialized"
                );
                Ok(Self {
                    label,
                    transport,
                    server_info,
                })
            },
            Err(e) => {
                warn!(upstream = %label, error = %e, "MCP initialize handshake failed");
                transport.close().await;
                Err(e)
            },
        }
    }

    pub fn server_info(&self) -> &InitializeResult {
        &self.server_info
    }

    /// Fetch every tool the server offers, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<McpToolDef>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        for _ in 0..MAX_LIST_PAGES {
            let params = cursor
                .take()
                .map(|c| serde_json::json!({ "cursor": c }));
            let page: ToolsListResult = self
                .transport
                .request("tools/list", params)
                .await?
                .into_result("tools/list")?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        debug!(upstream = %self.label, count = tools.len(), "fetched MCP tools");
        Ok(tools)
    }

    /// Invoke a tool. A result flagged `isError` is returned as data; use
    /// [`ToolsCallResult::into_text`] to treat it as a failure.
    pub async fn call_tool(&self, name: &str, arguments: Arguments) -> Result<ToolsCallResult> {
        let params = ToolsCallParams {
            name: name.into(),
            arguments,
        };
        let result: ToolsCallResult = self
            .transport
            .request("tools/call", Some(serde_json::to_value(&params)?))
            .await?
            .into_result("tools/call")?;
        debug!(
            upstream = %self.label,
            tool = name,
            is_error = result.is_error,
            items = result.content.len(),
            "MCP tool call finished"
        );
        Ok(result)
    }

    /// End the session and release the transport.
    pub async fn close(self) {
        self.transport.close().await;
    }
}

async fn initialize(
    transport: &dyn McpTransport,
    client_info: Implementation,
) -> Result<InitializeResult> {
    let params = InitializeParams {
        protocol_version: PROTOCOL_VERSION.into(),
        capabilities: ClientCapabilities::default(),
        client_info,
    };

    let result: InitializeResult = transport
        .request("initialize", Some(serde_json::to_value(&params)?))
        .await?
        .into_result("initialize")?;

    if !is_supported_version(&result.protocol_version) {
        return Err(ProtocolError::UnsupportedVersion {
            version: result.protocol_version,
        }
        .into());
    }

    transport.notify("notifications/initialized", None).await?;
    Ok(result)
}

/// Discover the upstream catalog in a session of its own.
pub async fn fetch_tools(target: &UpstreamTarget) -> Result<Vec<McpToolDef>> {
    let client = McpClient::connect(target).await?;
    let tools = client.list_tools().await;
    client.close().await;
    tools
}

/// Invoke one tool in a session of its own. The session is released whether
/// the call succeeds or not.
pub async fn call_once(
    target: &UpstreamTarget,
    name: &str,
    arguments: Arguments,
) -> Result<ToolsCallResult> {
    let client = McpClient::connect(target).await?;
    let result = client.call_tool(name, arguments).await;
    client.close().await;
    result
}

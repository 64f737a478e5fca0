//! Streamable HTTP transport for remote MCP servers.
//!
//! Every JSON-RPC message is an HTTP POST to one endpoint. The server may
//! answer with a plain JSON body or with an event stream carrying the
//! response, and may assign a session id that later requests must echo.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use {
    reqwest::Client,
    tokio::sync::RwLock,
    tracing::{debug, warn},
};

use crate::{
    error::{Error, McpTransportError, ProtocolError, Result},
    traits::McpTransport,
    types::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION},
};

const MCP_PROTOCOL_VERSION_HEADER: &str = "MCP-Protocol-Version";
const MCP_SESSION_ID_HEADER: &str = "Mcp-Session-Id";
const STREAMABLE_ACCEPT_HEADER: &str = "application/json, text/event-stream";

/// HTTP transport for a remote MCP server.
pub struct HttpTransport {
    client: Client,
    url: String,
    timeout: Duration,
    next_id: AtomicU64,
    session_id: RwLock<Option<String>>,
}

impl HttpTransport {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        url::Url::parse(url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| McpTransportError::Client { source })?;

        Ok(Self {
            client,
            url: url.to_string(),
            timeout,
            next_id: AtomicU64::new(1),
            session_id: RwLock::new(None),
        })
    }

    pub async fn session_id(&self) -> Option<String> {
        self.session_id.read().await.clone()
    }

    async fn post(&self, method: &str, body: &impl serde::Serialize) -> Result<reqwest::Response> {
        let mut req = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", STREAMABLE_ACCEPT_HEADER)
            .header(MCP_PROTOCOL_VERSION_HEADER, PROTOCOL_VERSION);

        if let Some(session_id) = self.session_id.read().await.clone() {
            req = req.header(MCP_SESSION_ID_HEADER, session_id);
        }

        let resp = req.json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::from(McpTransportError::Timeout {
                    method: method.to_string(),
                    secs: self.timeout.as_secs(),
                })
            } else {
                Error::from(e)
            }
        })?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(McpTransportError::Unauthorized {
                url: self.url.clone(),
            }
            .into());
        }

        self.store_session_id(&resp).await;
        Ok(resp)
    }

    async fn store_session_id(&self, response: &reqwest::Response) {
        let Some(session_id) = response
            .headers()
            .get(MCP_SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return;
        };

        let mut slot = self.session_id.write().await;
        if slot.as_deref() != Some(session_id) {
            debug!(url = %self.url, session_id, "updated MCP session id");
            *slot = Some(session_id.to_string());
        }
    }

    fn is_event_stream(resp: &reqwest::Response) -> bool {
        resp.headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|base| base.trim() == "text/event-stream")
    }
}

/// Pull the response for request `id` out of an event-stream body.
///
/// Events that are not that response (server notifications, progress) are
/// skipped.
fn parse_event_stream(body: &str, id: &serde_json::Value, method: &str) -> Result<JsonRpcResponse> {
    let mut events = Vec::new();
    let mut data = String::new();
    for line in body.lines() {
        let line = line.trim_end();
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.trim_start());
        } else if line.is_empty() && !data.is_empty() {
            events.push(std::mem::take(&mut data));
        }
    }
    if !data.is_empty() {
        events.push(data);
    }

    events
        .iter()
        .filter_map(|event| serde_json::from_str::<serde_json::Value>(event).ok())
        .filter(|value| value.get("method").is_none() && value.get("id") == Some(id))
        .find_map(|value| serde_json::from_value::<JsonRpcResponse>(value).ok())
        .ok_or_else(|| {
            ProtocolError::Malformed {
                method: method.to_string(),
                reason: "event stream carried no response for the request".into(),
            }
            .into()
        })
}

#[async_trait::async_trait]
impl McpTransport for HttpTransport {
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let req = JsonRpcRequest::new(id, method, params);

        debug!(method, id, url = %self.url, "client -> MCP server");

        let http_resp = self.post(method, &req).await?;
        let status = http_resp.status();
        if !status.is_success() {
            let body = http_resp.text().await.unwrap_or_default();
            return Err(McpTransportError::HttpStatus {
                status: status.as_u16(),
                method: method.to_string(),
                body,
            }
            .into());
        }

        let event_stream = Self::is_event_stream(&http_resp);
        let body = http_resp.text().await?;
        let resp = if event_stream {
            parse_event_stream(&body, &req.id, method)?
        } else {
            serde_json::from_str::<JsonRpcResponse>(&body).map_err(|e| {
                Error::from(ProtocolError::Malformed {
                    method: method.to_string(),
                    reason: e.to_string(),
                })
            })?
        };

        if resp.id != req.id {
            return Err(ProtocolError::IdMismatch {
                expected: req.id.to_string(),
                got: resp.id.to_string(),
            }
            .into());
        }

        if let Some(err) = &resp.error {
            return Err(ProtocolError::Rpc {
                method: method.to_string(),
                code: err.code,
                message: err.message.clone(),
            }
            .into());
        }

        Ok(resp)
    }

    async fn notify(&self, method: &str, params: Option<serde_json::Value>) -> Result<()> {
        let notif = JsonRpcNotification::new(method, params);

        debug!(method, url = %self.url, "client -> MCP server (notification)");

        let http_resp = self.post(method, &notif).await?;
        if !http_resp.status().is_success() {
            warn!(method, status = %http_resp.status(), "MCP notification returned non-success");
        }
        Ok(())
    }

    async fn close(&self) {
        let Some(session_id) = self.session_id.write().await.take() else {
            return;
        };

        let req = self
            .client
            .delete(&self.url)
            .timeout(Duration::from_secs(5))
            .header(MCP_PROTOCOL_VERSION_HEADER, PROTOCOL_VERSION)
            .header(MCP_SESSION_ID_HEADER, session_id);

        if let Err(e) = req.send().await {
            warn!(url = %self.url, error = %e, "failed to close MCP session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_rejects_invalid_url() {
        assert!(matches!(
            HttpTransport::new("not-a-url", TIMEOUT),
            Err(Error::UrlParse(_))
        ));
    }

    #[tokio::test]
    async fn test_request_unreachable_is_transport_failure() {
        let transport = HttpTransport::new("http://127.0.0.1:1/mcp", TIMEOUT).unwrap();
        let err = transport.request("tools/list", None).await.unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::Transport);
    }

    #[tokio::test]
    async fn test_401_returns_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(401)
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url(), TIMEOUT).unwrap();
        let err = transport.request("initialize", None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(McpTransportError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_non_success_status_keeps_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url(), TIMEOUT).unwrap();
        let err = transport.request("tools/list", None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(McpTransportError::HttpStatus { status: 502, ref body, .. })
                if body == "bad gateway"
        ));
    }

    #[tokio::test]
    async fn test_json_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_header("accept", STREAMABLE_ACCEPT_HEADER)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url(), TIMEOUT).unwrap();
        let resp = transport.request("ping", None).await.unwrap();
        assert_eq!(resp.result, Some(serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_rpc_error_is_protocol_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
            )
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url(), TIMEOUT).unwrap();
        let err = transport.request("resources/list", None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::Rpc { code: -32601, .. })
        ));
    }

    #[tokio::test]
    async fn test_mismatched_id_is_protocol_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":42,"result":{}}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url(), TIMEOUT).unwrap();
        let err = transport.request("ping", None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::IdMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_propagates_session_id() {
        let mut server = mockito::Server::new_async().await;

        let first = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("mcp-session-id", "session-123")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#)
            .create_async()
            .await;

        let second = server
            .mock("POST", "/")
            .match_header("mcp-session-id", "session-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":2,"result":{"ok":true}}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url(), TIMEOUT).unwrap();
        transport.request("initialize", None).await.unwrap();
        assert_eq!(transport.session_id().await.as_deref(), Some("session-123"));
        transport.request("tools/list", None).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_event_stream_skips_notifications() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "text/event-stream; charset=utf-8")
            .with_body(concat!(
                "event: message\n",
                "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\",\"params\":{}}\n\n",
                "event: message\n",
                "data: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}\n\n",
            ))
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url(), TIMEOUT).unwrap();
        let resp = transport.request("initialize", None).await.unwrap();
        assert_eq!(resp.result, Some(serde_json::json!({"ok": true})));
    }

    #[test]
    fn test_event_stream_without_response() {
        let body = "data: {\"jsonrpc\":\"2.0\",\"id\":7,\"result\":{}}\n\n";
        let err = parse_event_stream(body, &serde_json::json!(1), "ping").unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_close_sends_delete_with_session_id() {
        let mut server = mockito::Server::new_async().await;
        let init = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("mcp-session-id", "session-to-close")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/")
            .match_header("mcp-session-id", "session-to-close")
            .with_status(204)
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url(), TIMEOUT).unwrap();
        transport.request("initialize", None).await.unwrap();
        transport.close().await;
        assert_eq!(transport.session_id().await, None);

        init.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_close_without_session_is_noop() {
        let transport = HttpTransport::new("http://127.0.0.1:1/mcp", TIMEOUT).unwrap();
        transport.close().await;
    }
}

//! Stateless JSON-RPC endpoint speaking the MCP tool methods.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{get, post},
    },
    mentionbot_mcp::types::{
        self, INVALID_PARAMS, INVALID_REQUEST, JsonRpcError, JsonRpcResponse, METHOD_NOT_FOUND,
        PARSE_ERROR, PROTOCOL_VERSION, ToolsCallParams,
    },
    serde::Deserialize,
    serde_json::{Value, json},
    tracing::{debug, info},
};

use crate::{
    error::{Error, Result},
    provider::ToolProvider,
};

#[derive(Clone)]
struct ServerState {
    provider: Arc<dyn ToolProvider>,
    name: Arc<str>,
}

/// An inbound JSON-RPC message. Requests carry an id, notifications do not.
#[derive(Debug, Deserialize)]
struct Incoming {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

/// Build the router: `POST {path}` for JSON-RPC and `GET /healthz`.
///
/// Any other method on `path` is answered with `405`; there are no
/// server-initiated streams.
pub fn build_router(provider: Arc<dyn ToolProvider>, name: &str, path: &str) -> Router {
    let state = ServerState {
        provider,
        name: Arc::from(name),
    };
    Router::new()
        .route(path, post(rpc_handler))
        .route("/healthz", get(health_handler))
        .with_state(state)
}

/// Bind and serve until the task is cancelled.
pub async fn serve(router: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })?;
    info!(addr = %listener.local_addr()?, "tool server listening");
    axum::serve(listener, router).await?;
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn rpc_handler(State(state): State<ServerState>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return rpc_error(
                StatusCode::BAD_REQUEST,
                Value::Null,
                JsonRpcError::new(PARSE_ERROR, format!("parse error: {e}")),
            );
        },
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let message: Incoming = match serde_json::from_value(value) {
        Ok(message) => message,
        Err(e) => {
            return rpc_error(
                StatusCode::BAD_REQUEST,
                id,
                JsonRpcError::new(INVALID_REQUEST, format!("invalid request: {e}")),
            );
        },
    };

    let Some(id) = message.id else {
        debug!(method = %message.method, "notification received");
        return StatusCode::ACCEPTED.into_response();
    };

    debug!(method = %message.method, %id, "rpc request");
    let response = match dispatch(&state, &message.method, message.params).await {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => JsonRpcResponse::failure(id, error),
    };
    Json(response).into_response()
}

async fn dispatch(
    state: &ServerState,
    method: &str,
    params: Option<Value>,
) -> std::result::Result<Value, JsonRpcError> {
    match method {
        "initialize" => Ok(initialize(state, params.as_ref())),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": state.provider.tools() })),
        "tools/call" => {
            let params: ToolsCallParams = params
                .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "missing params"))
                .and_then(|p| {
                    serde_json::from_value(p).map_err(|e| {
                        JsonRpcError::new(INVALID_PARAMS, format!("invalid params: {e}"))
                    })
                })?;
            if !state.provider.has_tool(&params.name) {
                return Err(JsonRpcError::new(
                    INVALID_PARAMS,
                    format!("unknown tool: {}", params.name),
                ));
            }
            let result = state.provider.call(&params.name, params.arguments).await;
            serde_json::to_value(result)
                .map_err(|e| JsonRpcError::new(types::INTERNAL_ERROR, e.to_string()))
        },
        other => Err(JsonRpcError::new(
            METHOD_NOT_FOUND,
            format!("method not found: {other}"),
        )),
    }
}

fn initialize(state: &ServerState, params: Option<&Value>) -> Value {
    let requested = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .filter(|v| types::is_supported_version(v))
        .unwrap_or(PROTOCOL_VERSION);
    json!({
        "protocolVersion": requested,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": &*state.name, "version": env!("CARGO_PKG_VERSION") },
    })
}

fn rpc_error(status: StatusCode, id: Value, error: JsonRpcError) -> Response {
    (status, Json(JsonRpcResponse::failure(id, error))).into_response()
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        axum::{body::Body, http::Request},
        mentionbot_mcp::{Arguments, McpToolDef, ToolsCallResult},
        tower::ServiceExt,
    };

    struct EchoProvider {
        tools: Vec<McpToolDef>,
    }

    #[async_trait]
    impl ToolProvider for EchoProvider {
        fn tools(&self) -> &[McpToolDef] {
            &self.tools
        }

        async fn call(&self, _name: &str, arguments: Arguments) -> ToolsCallResult {
            ToolsCallResult::text(Value::Object(arguments).to_string())
        }
    }

    fn router() -> Router {
        let provider = EchoProvider {
            tools: vec![McpToolDef {
                name: "echo".into(),
                description: Some("Echo the arguments".into()),
                input_schema: json!({"type": "object"}),
                extra: serde_json::Map::new(),
            }],
        };
        build_router(Arc::new(provider), "test-server", "/mcp")
    }

    async fn post_raw(body: &str) -> (StatusCode, Option<Value>) {
        let resp = router()
            .oneshot(
                Request::post("/mcp")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).ok();
        (status, json)
    }

    async fn rpc(method: &str, params: Value) -> Value {
        let body = json!({"jsonrpc": "2.0", "id": 7, "method": method, "params": params});
        let (status, json) = post_raw(&body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        json.unwrap()
    }

    #[tokio::test]
    async fn initialize_echoes_supported_version() {
        let resp = rpc("initialize", json!({"protocolVersion": "2024-11-05"})).await;
        assert_eq!(resp["id"], 7);
        assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(resp["result"]["serverInfo"]["name"], "test-server");
    }

    #[tokio::test]
    async fn initialize_answers_latest_for_unknown_version() {
        let resp = rpc("initialize", json!({"protocolVersion": "1999-01-01"})).await;
        assert_eq!(resp["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn lists_tools() {
        let resp = rpc("tools/list", Value::Null).await;
        assert_eq!(resp["result"]["tools"][0]["name"], "echo");
        assert_eq!(resp["result"]["tools"][0]["inputSchema"], json!({"type": "object"}));
    }

    #[tokio::test]
    async fn calls_tool() {
        let resp = rpc("tools/call", json!({"name": "echo", "arguments": {"a": 1}})).await;
        assert_eq!(resp["result"]["content"][0]["text"], r#"{"a":1}"#);
        assert_eq!(resp["result"]["isError"], false);
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let resp = rpc("tools/call", json!({"name": "nope"})).await;
        assert_eq!(resp["error"]["code"], INVALID_PARAMS);
        assert!(resp["result"].is_null());
    }

    #[tokio::test]
    async fn missing_call_params_is_invalid_params() {
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call"});
        let (_, json) = post_raw(&body.to_string()).await;
        assert_eq!(json.unwrap()["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn unknown_method() {
        let resp = rpc("resources/list", Value::Null).await;
        assert_eq!(resp["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn ping() {
        let resp = rpc("ping", Value::Null).await;
        assert_eq!(resp["result"], json!({}));
    }

    #[tokio::test]
    async fn parse_error() {
        let (status, json) = post_raw("{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json = json.unwrap();
        assert_eq!(json["error"]["code"], PARSE_ERROR);
        assert!(json["id"].is_null());
    }

    #[tokio::test]
    async fn request_without_method_is_invalid() {
        let (status, json) = post_raw(r#"{"jsonrpc":"2.0","id":3}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json = json.unwrap();
        assert_eq!(json["error"]["code"], INVALID_REQUEST);
        assert_eq!(json["id"], 3);
    }

    #[tokio::test]
    async fn notification_is_accepted_without_body() {
        let (status, json) =
            post_raw(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(json.is_none());
    }

    #[tokio::test]
    async fn get_on_rpc_path_is_not_allowed() {
        let resp = router()
            .oneshot(Request::get("/mcp").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn health() {
        let resp = router()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json, json!({"ok": true}));
    }
}

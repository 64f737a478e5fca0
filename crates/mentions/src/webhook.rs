//! `POST /mentions` and `GET /healthz`.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
    },
    mentionbot_common::secret::constant_time_eq,
    serde_json::json,
    tracing::{info, warn},
};

use crate::{
    error::{Error, Result},
    parse::parse_batches,
    pipeline::Pipeline,
};

pub const SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Clone)]
struct WebhookState {
    pipeline: Arc<Pipeline>,
    secret: Option<Arc<str>>,
}

/// Build the webhook router. An empty or absent `secret` disables the
/// header check.
pub fn build_router(pipeline: Arc<Pipeline>, secret: Option<&str>) -> Router {
    let state = WebhookState {
        pipeline,
        secret: secret.filter(|s| !s.is_empty()).map(Arc::from),
    };
    Router::new()
        .route("/mentions", post(mentions_handler))
        .route("/healthz", get(health_handler))
        .with_state(state)
}

/// Bind and serve until the task is cancelled.
pub async fn serve(router: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "webhook listening");
    axum::serve(listener, router).await
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn mentions_handler(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    if let Some(expected) = state.secret.as_deref() {
        let presented = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !constant_time_eq(presented, expected) {
            warn!("webhook secret mismatch");
            return Err(Error::Unauthorized);
        }
    }

    let batches =
        parse_batches(&body).inspect_err(|e| warn!(error = %e, "unparsable webhook body"))?;
    let summary = state.pipeline.run(batches).await;
    Ok((StatusCode::ACCEPTED, Json(summary)))
}

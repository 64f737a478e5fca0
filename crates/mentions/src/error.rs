use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors of the mention pipeline.
///
/// Per-mention failures are recorded with their `Display` text in the
/// batch summary, so those variants print the underlying message as is.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Ask(String),
    #[error(transparent)]
    Post(#[from] mentionbot_x::Error),
    #[error("{0}")]
    Agent(String),
    #[error("deadline exceeded before processing started")]
    DeadlineBeforeStart,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    pub fn ask(message: impl Into<String>) -> Self {
        Self::Ask(message.into())
    }

    pub fn agent(message: impl Into<String>) -> Self {
        Self::Agent(message.into())
    }
}

impl From<mentionbot_mcp::Error> for Error {
    fn from(err: mentionbot_mcp::Error) -> Self {
        Self::Ask(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad request").into_response(),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized").into_response(),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use mentionbot_common::FromMessage;

/// Failures talking to the MCP server: spawn, I/O, HTTP status, timeouts.
#[derive(Debug, thiserror::Error)]
pub enum McpTransportError {
    #[error("failed to spawn MCP server '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("MCP server '{command}' did not expose piped stdin/stdout")]
    Stdio { command: String },
    #[error("failed to build HTTP client for MCP transport: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    #[error("MCP server closed the connection before answering '{method}'")]
    Closed { method: String },
    #[error("MCP request '{method}' timed out after {secs}s")]
    Timeout { method: String, secs: u64 },
    #[error("MCP server returned HTTP {status} for '{method}': {body}")]
    HttpStatus {
        status: u16,
        method: String,
        body: String,
    },
    #[error("MCP server at {url} requires authorization")]
    Unauthorized { url: String },
}

/// The server answered, but not with what the protocol allows.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("MCP error on '{method}': code={code} message={message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },
    #[error("MCP server returned no result for '{method}'")]
    MissingResult { method: String },
    #[error("malformed '{method}' response: {reason}")]
    Malformed { method: String, reason: String },
    #[error("MCP server negotiated unsupported protocol version '{version}'")]
    UnsupportedVersion { version: String },
    #[error("response id {got} does not match request id {expected}")]
    IdMismatch { expected: String, got: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),
    #[error(transparent)]
    Transport(#[from] McpTransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("tool '{tool}' failed: {message}")]
    Application { tool: String, message: String },
    #[error("{message}")]
    Message { message: String },
}

/// Coarse classification of an [`Error`], used by callers that only need to
/// know which side of the conversation went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Could not reach the server or the connection broke.
    Transport,
    /// The server answered with something the protocol does not allow.
    Protocol,
    /// The tool ran and reported a failure.
    Application,
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn application(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Application {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Io(_) | Self::Reqwest(_) | Self::UrlParse(_) | Self::Transport(_) => {
                FailureKind::Transport
            },
            Self::SerdeJson(_) | Self::Protocol(_) => FailureKind::Protocol,
            Self::Application { .. } | Self::Message { .. } => FailureKind::Application,
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

mentionbot_common::impl_context!();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_failures() {
        let transport: Error = McpTransportError::Closed {
            method: "tools/call".into(),
        }
        .into();
        assert_eq!(transport.kind(), FailureKind::Transport);

        let protocol: Error = ProtocolError::UnsupportedVersion {
            version: "1999-01-01".into(),
        }
        .into();
        assert_eq!(protocol.kind(), FailureKind::Protocol);

        let stdio: Error = McpTransportError::Stdio {
            command: "npx".into(),
        }
        .into();
        assert_eq!(stdio.kind(), FailureKind::Transport);

        let application = Error::application("coingecko.answer", "rate limited");
        assert_eq!(application.kind(), FailureKind::Application);
        assert_eq!(
            application.to_string(),
            "tool 'coingecko.answer' failed: rate limited"
        );
    }

    #[test]
    fn context_wraps_io_errors() {
        let io: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("broken pipe"));
        let err = io.context("writing request").unwrap_err();
        assert_eq!(err.to_string(), "writing request: broken pipe");
    }
}

//! Where an upstream MCP server lives and how to reach it.

use std::{collections::HashMap, fmt, time::Duration};

use crate::{
    error::Result, http_transport::HttpTransport, traits::McpTransport, transport::StdioTransport,
    types::Implementation,
};

/// Default request timeout for a local child process.
pub const DEFAULT_STDIO_TIMEOUT: Duration = Duration::from_secs(30);
/// Default request timeout for a remote HTTP server.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A local command speaking JSON-RPC on stdin/stdout.
    Stdio {
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
    },
    /// A remote streamable HTTP endpoint.
    Http { url: String },
}

/// A reachable upstream MCP server plus the identity we present to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub endpoint: Endpoint,
    pub request_timeout: Duration,
    pub client_info: Implementation,
}

impl UpstreamTarget {
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            endpoint: Endpoint::Stdio {
                command: command.into(),
                args,
                env: HashMap::new(),
            },
            request_timeout: DEFAULT_STDIO_TIMEOUT,
            client_info: default_client_info(),
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::Http { url: url.into() },
            request_timeout: DEFAULT_HTTP_TIMEOUT,
            client_info: default_client_info(),
        }
    }

    /// Extra environment for a stdio child. Ignored for HTTP targets.
    #[must_use]
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        if let Endpoint::Stdio { env, .. } = &mut self.endpoint {
            env.extend(vars);
        }
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_info.name = name.into();
        self
    }

    /// Open a fresh transport. Nothing is shared between calls.
    pub(crate) fn open(&self) -> Result<Box<dyn McpTransport>> {
        Ok(match &self.endpoint {
            Endpoint::Stdio { command, args, env } => Box::new(StdioTransport::spawn(
                command,
                args,
                env,
                self.request_timeout,
            )?),
            Endpoint::Http { url } => Box::new(HttpTransport::new(url, self.request_timeout)?),
        })
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.endpoint {
            Endpoint::Stdio { command, args, .. } if args.is_empty() => write!(f, "{command}"),
            Endpoint::Stdio { command, args, .. } => write!(f, "{command} {}", args.join(" ")),
            Endpoint::Http { url } => write!(f, "{url}"),
        }
    }
}

fn default_client_info() -> Implementation {
    Implementation::new("mentionbot", env!("CARGO_PKG_VERSION"))
}

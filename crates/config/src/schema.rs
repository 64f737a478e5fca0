//! Configuration schema for every mentionbot process.

use std::collections::HashMap;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration shared by the `serve`, `proxy`, `x-tools` and `ask`
/// commands. Each command reads only the sections it needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionbotConfig {
    pub server: ServerConfig,
    /// Upstream MCP server the bot asks questions through.
    pub upstream: UpstreamConfig,
    pub asker: AskerConfig,
    pub x: XConfig,
    pub agent: AgentConfig,
    pub proxy: ProxyConfig,
    pub x_tools: ToolServerConfig,
}

/// Webhook server settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Shared secret expected in `X-Webhook-Secret`. Empty disables the check.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub webhook_secret: Option<Secret<String>>,
    /// Deadline applied to a whole webhook batch.
    pub request_timeout_secs: u64,
    /// Number of mentions processed at once. `1` processes sequentially.
    pub concurrency: usize,
}

impl ServerConfig {
    /// The configured webhook secret, or `None` when unset or empty.
    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            webhook_secret: None,
            request_timeout_secs: 120,
            concurrency: 1,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

/// Transport type for upstream MCP server connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    Stdio,
    Http,
}

/// How to reach an upstream MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Explicit transport. When unset, `http` is used if `url` is set and
    /// `stdio` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportType>,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Per-request timeout for a single JSON-RPC exchange.
    pub request_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn resolved_transport(&self) -> TransportType {
        match self.transport {
            Some(transport) => transport,
            None if self.url.as_deref().is_some_and(|u| !u.trim().is_empty()) => {
                TransportType::Http
            },
            None => TransportType::Stdio,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            transport: None,
            command: String::new(),
            args: Vec::new(),
            env: HashMap::new(),
            url: None,
            request_timeout_secs: 60,
        }
    }
}

/// The "ask a question" tool used in Direct mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AskerConfig {
    pub tool: String,
    /// Argument name the prompt is passed under.
    pub question_key: String,
    /// Prompt wrapped around the normalized mention text. `{question}` is
    /// replaced with the text.
    pub prompt_template: String,
}

impl Default for AskerConfig {
    fn default() -> Self {
        Self {
            tool: "coingecko.answer".into(),
            question_key: "question".into(),
            prompt_template:
                "Answer the user's question about CoinGecko data:\n\n{question}\n\nRespond concisely."
                    .into(),
        }
    }
}

/// Credential scheme for the social API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Bearer,
    #[serde(alias = "oauth1a")]
    OAuth1,
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "bearer" | "oauth2" => Ok(Self::Bearer),
            "oauth1" | "oauth1a" => Ok(Self::OAuth1),
            other => Err(format!("unknown auth mode '{other}' (expected bearer or oauth1)")),
        }
    }
}

/// Social API (X / Twitter v2) settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct XConfig {
    pub base_url: String,
    pub auth_mode: AuthMode,
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub bearer_token: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_key: Option<String>,
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub consumer_secret: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub access_secret: Option<Secret<String>>,
    pub request_timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for XConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitter.com/2".into(),
            auth_mode: AuthMode::Bearer,
            bearer_token: None,
            consumer_key: None,
            consumer_secret: None,
            access_token: None,
            access_secret: None,
            request_timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl std::fmt::Debug for XConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |s: &Option<Secret<String>>| s.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("XConfig")
            .field("base_url", &self.base_url)
            .field("auth_mode", &self.auth_mode)
            .field("bearer_token", &redact(&self.bearer_token))
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &redact(&self.consumer_secret))
            .field("access_token", &self.access_token)
            .field("access_secret", &redact(&self.access_secret))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Bounded retry for transient network failures when posting replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

/// External agent used in Delegated mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent executable. When set, the bot runs in Delegated mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Arguments placed before `-q <question>`.
    pub args: Vec<String>,
    /// Extra environment for the agent process.
    pub env: HashMap<String, String>,
}

impl AgentConfig {
    /// The agent command, or `None` when unset or blank.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// Tool gateway (`mentionbot proxy`) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub bind: String,
    pub port: u16,
    pub path: String,
    pub name: String,
    pub upstream: UpstreamConfig,
}

impl ProxyConfig {
    /// The listening surface of the gateway.
    pub fn server(&self) -> ToolServerConfig {
        ToolServerConfig {
            bind: self.bind.clone(),
            port: self.port,
            path: self.path.clone(),
            name: self.name.clone(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8082,
            path: "/mcp".into(),
            name: "cg-proxy".into(),
            upstream: UpstreamConfig::default(),
        }
    }
}

/// Listening surface of an MCP tool server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolServerConfig {
    pub bind: String,
    pub port: u16,
    /// Endpoint path for JSON-RPC requests.
    pub path: String,
    /// Name reported in `serverInfo`.
    pub name: String,
}

impl Default for ToolServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8081,
            path: "/mcp".into(),
            name: "x-poster".into(),
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_historical_ports_and_tool() {
        let cfg = MentionbotConfig::default();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.proxy.port, 8082);
        assert_eq!(cfg.x_tools.port, 8081);
        assert_eq!(cfg.asker.tool, "coingecko.answer");
        assert_eq!(cfg.x.base_url, "https://api.twitter.com/2");
        assert_eq!(cfg.x.auth_mode, AuthMode::Bearer);
    }

    #[test]
    fn empty_webhook_secret_is_disabled() {
        let server = ServerConfig {
            webhook_secret: Some(Secret::new(String::new())),
            ..Default::default()
        };
        assert_eq!(server.webhook_secret(), None);

        let server = ServerConfig {
            webhook_secret: Some(Secret::new("s3cr3t".into())),
            ..Default::default()
        };
        assert_eq!(server.webhook_secret(), Some("s3cr3t"));
    }

    #[test]
    fn transport_resolution_prefers_explicit_then_url() {
        let mut upstream = UpstreamConfig::default();
        assert_eq!(upstream.resolved_transport(), TransportType::Stdio);

        upstream.url = Some("http://localhost:8082/mcp".into());
        assert_eq!(upstream.resolved_transport(), TransportType::Http);

        upstream.transport = Some(TransportType::Stdio);
        assert_eq!(upstream.resolved_transport(), TransportType::Stdio);
    }

    #[test]
    fn auth_mode_parses_case_insensitively() {
        assert_eq!("OAuth1".parse::<AuthMode>().unwrap(), AuthMode::OAuth1);
        assert_eq!("".parse::<AuthMode>().unwrap(), AuthMode::Bearer);
        assert!("basic".parse::<AuthMode>().is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let x = XConfig {
            bearer_token: Some(Secret::new("very-secret-token".into())),
            ..Default::default()
        };
        let rendered = format!("{x:?}");
        assert!(!rendered.contains("very-secret-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn proxy_section_keeps_gateway_defaults() {
        let cfg: MentionbotConfig = toml::from_str(
            r#"
            [proxy]
            name = "my-proxy"

            [proxy.upstream]
            command = "npx"
            args = ["-y", "@coingecko/mcp"]
            "#,
        )
        .unwrap();
        let server = cfg.proxy.server();
        assert_eq!(server.port, 8082);
        assert_eq!(server.name, "my-proxy");
        assert_eq!(server.path, "/mcp");
        assert_eq!(cfg.proxy.upstream.args, vec!["-y", "@coingecko/mcp"]);
    }
}

//! Configuration loading, env substitution, env overrides, and validation.
//!
//! Config files: `mentionbot.toml`, `mentionbot.yaml`, `mentionbot.yml`, or
//! `mentionbot.json`, searched in `./` then `~/.config/mentionbot/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file text, followed by overrides from the historical environment variables
//! (`MCP_CMD`, `X_BEARER_TOKEN`, ...).

pub mod env;
pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    env::apply_env_overrides,
    error::{ConfigError, Diagnostic, Result},
    loader::{discover_and_load, load_config},
    schema::{
        AgentConfig, AskerConfig, AuthMode, MentionbotConfig, ProxyConfig, RetryConfig,
        ServerConfig, ToolServerConfig, TransportType, UpstreamConfig, XConfig,
    },
    validate::{validate_bot, validate_proxy, validate_x_tools},
};

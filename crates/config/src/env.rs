//! Environment variable overrides applied on top of the loaded config file.
//!
//! The variable names are the ones operators already deploy with, so a bot
//! configured purely through the environment needs no config file at all.

use {secrecy::Secret, tracing::debug};

use crate::{
    error::{ConfigError, Result},
    schema::{AuthMode, MentionbotConfig},
};

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut MentionbotConfig) -> Result<()> {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

/// Apply overrides using a custom lookup function.
pub fn apply_env_overrides_with(
    config: &mut MentionbotConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    // Set-but-empty values are ignored, except where empty has a meaning.
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(port) = get("PORT") {
        config.server.port = parse_port("PORT", &port)?;
    }
    if let Some(secret) = lookup("WEBHOOK_SECRET") {
        // An explicitly empty secret disables the webhook check.
        config.server.webhook_secret = Some(Secret::new(secret));
    }

    if let Some(command) = lookup("AGENT_CMD") {
        config.agent.command = Some(command);
    }
    for (source, target) in [
        ("AGENT_CG_MCP_HTTP", "CG_MCP_HTTP"),
        ("AGENT_X_MCP_HTTP", "X_MCP_HTTP"),
        ("OPENAI_API_KEY", "OPENAI_API_KEY"),
        ("OPENAI_MODEL", "OPENAI_MODEL"),
    ] {
        if let Some(value) = get(source) {
            config.agent.env.insert(target.to_string(), value);
        }
    }

    if let Some(command) = get("MCP_CMD") {
        config.upstream.command = command;
    }
    if let Some(args) = get("MCP_ARGS") {
        config.upstream.args = split_args(&args);
    }
    if let Some(url) = get("MCP_URL") {
        config.upstream.url = Some(url);
    }
    if let Some(tool) = get("MCP_TOOL") {
        config.asker.tool = tool;
    }

    if let Some(base) = get("X_BASE") {
        config.x.base_url = base;
    }
    if let Some(mode) = get("X_AUTH_MODE") {
        config.x.auth_mode = mode
            .parse::<AuthMode>()
            .map_err(|message| ConfigError::InvalidEnv {
                var: "X_AUTH_MODE",
                message,
            })?;
    }
    if let Some(token) = get("X_BEARER_TOKEN") {
        config.x.bearer_token = Some(Secret::new(token));
    }
    if let Some(key) = get("X_CONSUMER_KEY") {
        config.x.consumer_key = Some(key);
    }
    if let Some(secret) = get("X_CONSUMER_SECRET") {
        config.x.consumer_secret = Some(Secret::new(secret));
    }
    if let Some(token) = get("X_ACCESS_TOKEN") {
        config.x.access_token = Some(token);
    }
    if let Some(secret) = get("X_ACCESS_SECRET") {
        config.x.access_secret = Some(Secret::new(secret));
    }

    if let Some(command) = get("CG_MCP_CMD") {
        config.proxy.upstream.command = command;
    }
    if let Some(args) = get("CG_MCP_ARGS") {
        config.proxy.upstream.args = split_args(&args);
    }
    if let Some(url) = get("CG_MCP_URL") {
        config.proxy.upstream.url = Some(url);
    }
    if let Some(port) = get("PROXY_PORT") {
        config.proxy.port = parse_port("PROXY_PORT", &port)?;
    }
    if let Some(port) = get("X_TOOLS_PORT") {
        config.x_tools.port = parse_port("X_TOOLS_PORT", &port)?;
    }

    debug!("applied environment overrides");
    Ok(())
}

/// Split a command-line style argument string on whitespace.
pub fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(String::from).collect()
}

fn parse_port(var: &'static str, raw: &str) -> Result<u16> {
    raw.trim()
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnv {
            var,
            message: format!("'{raw}' is not a valid port: {e}"),
        })
}

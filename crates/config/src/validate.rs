//! Startup validation. Every command validates the sections it depends on and
//! refuses to start when a required command or credential is missing.

use secrecy::{ExposeSecret, Secret};

use crate::{
    error::{ConfigError, Diagnostic, Result},
    schema::{AuthMode, MentionbotConfig, TransportType, UpstreamConfig, XConfig},
};

/// Validate the webhook bot (`mentionbot serve`).
///
/// With an agent command configured the bot runs in Delegated mode and needs
/// nothing else. Otherwise it needs an upstream MCP server and social API
/// credentials.
pub fn validate_bot(config: &MentionbotConfig) -> Result<()> {
    let mut diagnostics = Vec::new();

    if config.server.concurrency == 0 {
        diagnostics.push(diag("server.concurrency", "must be at least 1"));
    }
    if config.server.request_timeout_secs == 0 {
        diagnostics.push(diag("server.request_timeout_secs", "must be greater than 0"));
    }

    if config.agent.command().is_none() {
        check_upstream("upstream", &config.upstream, &mut diagnostics);
        if config.asker.tool.trim().is_empty() {
            diagnostics.push(diag("asker.tool", "tool name is required"));
        }
        check_x_credentials(&config.x, &mut diagnostics);
    }

    finish(diagnostics)
}

/// Validate the tool gateway (`mentionbot proxy`).
pub fn validate_proxy(config: &MentionbotConfig) -> Result<()> {
    let mut diagnostics = Vec::new();
    check_upstream("proxy.upstream", &config.proxy.upstream, &mut diagnostics);
    check_path("proxy.path", &config.proxy.path, &mut diagnostics);
    finish(diagnostics)
}

/// Validate the reply-posting tool server (`mentionbot x-tools`).
pub fn validate_x_tools(config: &MentionbotConfig) -> Result<()> {
    let mut diagnostics = Vec::new();
    check_x_credentials(&config.x, &mut diagnostics);
    check_path("x_tools.path", &config.x_tools.path, &mut diagnostics);
    finish(diagnostics)
}

fn check_upstream(prefix: &str, upstream: &UpstreamConfig, diagnostics: &mut Vec<Diagnostic>) {
    match upstream.resolved_transport() {
        TransportType::Stdio if upstream.command.trim().is_empty() => diagnostics.push(diag(
            &format!("{prefix}.command"),
            "MCP server command is required for the stdio transport",
        )),
        TransportType::Http
            if upstream
                .url
                .as_deref()
                .is_none_or(|u| !(u.starts_with("http://") || u.starts_with("https://"))) =>
        {
            diagnostics.push(diag(
                &format!("{prefix}.url"),
                "an http(s) URL is required for the http transport",
            ));
        },
        _ => {},
    }
    if upstream.request_timeout_secs == 0 {
        diagnostics.push(diag(
            &format!("{prefix}.request_timeout_secs"),
            "must be greater than 0",
        ));
    }
}

fn check_x_credentials(x: &XConfig, diagnostics: &mut Vec<Diagnostic>) {
    if x.base_url.trim().is_empty() {
        diagnostics.push(diag("x.base_url", "social API base URL is required"));
    }
    if x.retry.max_attempts == 0 {
        diagnostics.push(diag("x.retry.max_attempts", "must be at least 1"));
    }
    match x.auth_mode {
        AuthMode::Bearer => {
            if !secret_present(x.bearer_token.as_ref()) {
                diagnostics.push(diag(
                    "x.bearer_token",
                    "user-context bearer token with tweet.write is required",
                ));
            }
        },
        AuthMode::OAuth1 => {
            let keys = [
                ("x.consumer_key", x.consumer_key.as_deref().is_some_and(non_blank)),
                ("x.consumer_secret", secret_present(x.consumer_secret.as_ref())),
                ("x.access_token", x.access_token.as_deref().is_some_and(non_blank)),
                ("x.access_secret", secret_present(x.access_secret.as_ref())),
            ];
            for (path, present) in keys {
                if !present {
                    diagnostics.push(diag(path, "required for oauth1 auth mode"));
                }
            }
        },
    }
}

fn check_path(path: &str, value: &str, diagnostics: &mut Vec<Diagnostic>) {
    if !value.starts_with('/') {
        diagnostics.push(diag(path, "endpoint path must start with '/'"));
    }
}

fn secret_present(secret: Option<&Secret<String>>) -> bool {
    secret.is_some_and(|s| non_blank(s.expose_secret()))
}

fn non_blank(s: &str) -> bool {
    !s.trim().is_empty()
}

fn diag(path: &str, message: &str) -> Diagnostic {
    Diagnostic {
        path: path.to_string(),
        message: message.to_string(),
    }
}

fn finish(diagnostics: Vec<Diagnostic>) -> Result<()> {
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(diagnostics))
    }
}

use std::time::Duration;

use {
    mentionbot_config::{TransportType, UpstreamConfig},
    mentionbot_mcp::UpstreamTarget,
};

/// Resolve an upstream section into something the MCP client can open.
pub fn target(config: &UpstreamConfig, client_name: &str) -> UpstreamTarget {
    let target = match config.resolved_transport() {
        TransportType::Http => UpstreamTarget::http(config.url.clone().unwrap_or_default()),
        TransportType::Stdio => {
            UpstreamTarget::stdio(config.command.clone(), config.args.clone())
                .with_env(config.env.clone())
        },
    };
    target
        .with_timeout(Duration::from_secs(config.request_timeout_secs))
        .with_client_name(client_name)
}

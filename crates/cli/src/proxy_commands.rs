use std::sync::Arc;

use {
    mentionbot_config::MentionbotConfig,
    mentionbot_tool_proxy::{UpstreamForwarder, build_router, serve},
    mentionbot_x::{PostReplyTool, ReplyPoster},
    tracing::info,
};

use crate::{socket_addr, upstream};

/// `mentionbot proxy`: discover the upstream catalog once, then serve it.
pub async fn run_proxy(config: MentionbotConfig) -> anyhow::Result<()> {
    mentionbot_config::validate_proxy(&config)?;

    let target = upstream::target(&config.proxy.upstream, &config.proxy.name);
    let forwarder = UpstreamForwarder::discover(target).await?;
    info!(
        tools = forwarder.registry().len(),
        name = %config.proxy.name,
        "tool gateway ready"
    );

    let server = config.proxy.server();
    let router = build_router(Arc::new(forwarder), &server.name, &server.path);
    serve(router, socket_addr(&server.bind, server.port)?).await?;
    Ok(())
}

/// `mentionbot x-tools`: serve `twitter.post_reply`.
pub async fn run_x_tools(config: MentionbotConfig) -> anyhow::Result<()> {
    mentionbot_config::validate_x_tools(&config)?;

    let poster = ReplyPoster::from_config(&config.x)?;
    info!(
        endpoint = %poster.endpoint(),
        auth_mode = ?config.x.auth_mode,
        "reply tool ready"
    );

    let server = &config.x_tools;
    let router = build_router(
        Arc::new(PostReplyTool::new(Arc::new(poster))),
        &server.name,
        &server.path,
    );
    serve(router, socket_addr(&server.bind, server.port)?).await?;
    Ok(())
}

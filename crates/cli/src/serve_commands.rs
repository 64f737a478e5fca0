use std::{sync::Arc, time::Duration};

use {
    mentionbot_config::MentionbotConfig,
    mentionbot_mentions::{McpAsker, Pipeline, ProcessAgentRunner, Strategy},
    mentionbot_x::ReplyPoster,
    tracing::info,
};

use crate::{socket_addr, upstream};

/// Pick the strategy once. A configured agent command wins over the
/// asker/poster pair.
fn strategy(config: &MentionbotConfig) -> anyhow::Result<Strategy> {
    if let Some(runner) = ProcessAgentRunner::from_config(&config.agent) {
        info!(command = config.agent.command().unwrap_or_default(), "delegating mentions to agent");
        return Ok(Strategy::Delegated {
            runner: Arc::new(runner),
        });
    }

    let target = upstream::target(&config.upstream, "mentionbot");
    info!(upstream = %target, tool = %config.asker.tool, "answering mentions directly");
    let asker = McpAsker::new(target, &config.asker);
    let poster = ReplyPoster::from_config(&config.x)?;
    info!(endpoint = %poster.endpoint(), "posting replies");
    Ok(Strategy::Direct {
        asker: Arc::new(asker),
        sink: Arc::new(poster),
    })
}

pub async fn run(config: MentionbotConfig) -> anyhow::Result<()> {
    mentionbot_config::validate_bot(&config)?;

    let pipeline = Pipeline::new(strategy(&config)?)
        .with_timeout(Duration::from_secs(config.server.request_timeout_secs))
        .with_concurrency(config.server.concurrency);
    info!(
        mode = pipeline.mode(),
        secret = config.server.webhook_secret().is_some(),
        "mention pipeline ready"
    );

    let router =
        mentionbot_mentions::build_router(Arc::new(pipeline), config.server.webhook_secret());
    let addr = socket_addr(&config.server.bind, config.server.port)?;
    mentionbot_mentions::serve(router, addr).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, secrecy::Secret};

    #[test]
    fn agent_command_takes_precedence() {
        let mut config = MentionbotConfig::default();
        config.agent.command = Some("/opt/agent".into());
        config.upstream.command = "npx".into();
        config.x.bearer_token = Some(Secret::new("t".into()));
        assert!(matches!(
            strategy(&config).unwrap(),
            Strategy::Delegated { .. }
        ));
    }

    #[test]
    fn direct_without_agent() {
        let mut config = MentionbotConfig::default();
        config.upstream.command = "npx".into();
        config.x.bearer_token = Some(Secret::new("t".into()));
        assert_eq!(strategy(&config).unwrap().name(), "direct");
    }

    #[test]
    fn direct_needs_credentials() {
        let mut config = MentionbotConfig::default();
        config.upstream.command = "npx".into();
        assert!(strategy(&config).is_err());
    }
}

use std::time::Duration;

use {
    anyhow::{Context, bail},
    clap::Args,
    mentionbot_config::{MentionbotConfig, TransportType},
    mentionbot_mcp::{
        Arguments, McpToolDef, UpstreamTarget, call_once, describe_with_schema, fetch_tools,
    },
    mentionbot_mentions::{Asker, McpAsker},
    serde_json::Value,
};

use crate::upstream;

const ASK_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Args)]
pub struct AskArgs {
    /// Question to ask the configured tool.
    #[arg(short = 'q', long = "question", default_value = "price of btc in usd?")]
    question: String,
    /// List available tools instead of asking a question.
    #[arg(long)]
    list: bool,
    /// Call a specific tool (overrides -q).
    #[arg(long)]
    tool: Option<String>,
    /// JSON object with tool arguments (used with --tool).
    #[arg(long)]
    args: Option<String>,
}

pub async fn run(config: MentionbotConfig, args: AskArgs) -> anyhow::Result<()> {
    let upstream = &config.upstream;
    match upstream.resolved_transport() {
        TransportType::Stdio if upstream.command.trim().is_empty() => {
            bail!("an upstream MCP command is required (upstream.command or MCP_CMD)")
        },
        TransportType::Http if upstream.url.as_deref().is_none_or(str::is_empty) => {
            bail!("an upstream MCP URL is required (upstream.url or MCP_URL)")
        },
        _ => {},
    }
    let target = upstream::target(upstream, "mentionbot-ask");

    tokio::time::timeout(ASK_TIMEOUT, dispatch(&config, target, args))
        .await
        .with_context(|| format!("timed out after {}s", ASK_TIMEOUT.as_secs()))?
}

async fn dispatch(
    config: &MentionbotConfig,
    target: UpstreamTarget,
    args: AskArgs,
) -> anyhow::Result<()> {
    if args.list {
        for tool in fetch_tools(&target).await? {
            println!("{}", render_tool(&tool));
        }
        return Ok(());
    }

    if let Some(tool) = &args.tool {
        let arguments = parse_arguments(args.args.as_deref())?;
        let result = call_once(&target, tool, arguments).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let answer = McpAsker::new(target, &config.asker)
        .ask(&args.question)
        .await?;
    println!("{answer}");
    Ok(())
}

/// One `--list` entry: the tool name, then its description and schema
/// indented below it.
fn render_tool(tool: &McpToolDef) -> String {
    let mut out = format!("tool: {}", tool.name);
    for line in describe_with_schema(tool).lines() {
        out.push_str("\n  ");
        out.push_str(line);
    }
    out
}

fn parse_arguments(raw: Option<&str>) -> anyhow::Result<Arguments> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(Arguments::new());
    };
    match serde_json::from_str::<Value>(raw).context("invalid --args JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("--args must be a JSON object, got {other}"),
    }
}

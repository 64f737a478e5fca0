mod ask_commands;
mod proxy_commands;
mod serve_commands;
mod upstream;

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    mentionbot_config::MentionbotConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "mentionbot", about = "Answers social mentions through MCP tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (overrides discovery of ./mentionbot.toml and friends).
    #[arg(long, global = true, env = "MENTIONBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Port to listen on (overrides config value for the selected server).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the mention webhook (default when no subcommand is provided).
    Serve,
    /// Republish an upstream MCP server's tools over HTTP.
    Proxy,
    /// Serve the reply-posting MCP tool.
    XTools,
    /// Query the upstream MCP server directly.
    Ask(ask_commands::AskArgs),
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Config file (explicit or discovered), then environment overrides.
fn load_config(cli: &Cli) -> anyhow::Result<MentionbotConfig> {
    let mut config = match &cli.config {
        Some(path) => mentionbot_config::load_config(path)?,
        None => mentionbot_config::discover_and_load(),
    };
    mentionbot_config::apply_env_overrides(&mut config)?;
    Ok(config)
}

pub(crate) fn socket_addr(bind: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let ip: IpAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address '{bind}'"))?;
    Ok(SocketAddr::new(ip, port))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "mentionbot starting");

    let mut config = load_config(&cli)?;

    match cli.command {
        None | Some(Commands::Serve) => {
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            serve_commands::run(config).await
        },
        Some(Commands::Proxy) => {
            if let Some(port) = cli.port {
                config.proxy.port = port;
            }
            proxy_commands::run_proxy(config).await
        },
        Some(Commands::XTools) => {
            if let Some(port) = cli.port {
                config.x_tools.port = port;
            }
            proxy_commands::run_x_tools(config).await
        },
        Some(Commands::Ask(args)) => ask_commands::run(config, args).await,
    }
}

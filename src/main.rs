//! wsio CLI: run an inbound demo server, or connect an outbound demo client against one.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::signal;
use tracing::{error, info, warn};

use wsio::{
    transport_factory, Role, ServerConfig, SessionConfig, Socket, WebSocketTransportConfig,
    WsioServer,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs the inbound echo/demo server.
    Server {
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: String,
    },
    /// Connects to a server as an outbound client, fires one event, then waits.
    Client {
        #[arg(long, default_value = "ws://127.0.0.1:3000/socket.io/?transport=websocket")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    match args.command {
        Command::Server { bind } => run_server(bind).await,
        Command::Client { url } => run_client(url).await,
    }
}

async fn run_server(bind: String) -> Result<()> {
    let mut config = ServerConfig::from_env();
    config.bind_address = bind;

    info!(address = %config.bind_address, "starting wsio server");
    let server = WsioServer::new(config);

    tokio::select! {
        result = server.serve() => result.context("server exited with an error"),
        _ = shutdown_signal() => {
            info!("received shutdown signal");
            Ok(())
        }
    }
}

async fn run_client(url: String) -> Result<()> {
    let url = url::Url::parse(&url).context("invalid server url")?;
    let config = WebSocketTransportConfig::new("wsio-client", url);
    let factory = transport_factory(config);

    info!("connecting to server");
    let socket = Socket::connect("wsio-client", SessionConfig::default(), factory)
        .await
        .context("failed to establish outbound session")?;

    socket.on_open(|| info!("session open"));
    socket.on_close(|| info!("session closed"));
    socket.on_error(|error| warn!(%error, "session error"));

    socket.listen("greeting", std::sync::Arc::new(|args: &[serde_json::Value]| {
        info!(?args, "received greeting");
    }))?;

    socket.fire("hello", vec![json!("from the wsio CLI")]).await?;

    info!("waiting for Ctrl+C (role = {:?})", Role::Outbound);
    shutdown_signal().await;
    socket.destroy();
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        other => {
            eprintln!("invalid log level '{other}', defaulting to 'info'");
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
    }
}

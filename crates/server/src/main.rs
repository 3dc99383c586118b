use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use hotsearch_mcp::{Dispatcher, McpServer};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod api;
mod config;
mod sse;
mod ui;

use config::{AppState, CredentialSource, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "hotsearch", version)]
#[command(about = "MCP server for the Baidu hot-search list", long_about = None)]
struct Args {
    /// Transport to serve on
    #[arg(value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Port for the sse transport
    #[arg(default_value_t = 3000)]
    port: u16,

    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Host to bind the sse transport to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// One client over stdin/stdout
    Stdio,
    /// Many clients over HTTP with an event stream
    Sse,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the stdio protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,hotsearch=info,tower_http=info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    };

    // The stdin reader thread cannot be cancelled, so leave without waiting
    // for the runtime to wind down
    match run(args).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<()> {
    tracing::info!("Starting hot-search MCP server ({:?} transport)", args.transport);

    let config = ServerConfig::load(&args.config).context("Configuration is invalid")?;
    match &config.source {
        CredentialSource::Environment => tracing::info!("Credentials from environment"),
        CredentialSource::File(path) => tracing::info!("Credentials from {}", path.display()),
    }
    tracing::info!("Credentials: {}", config.credentials.masked());
    tracing::info!("Upstream endpoint: {}", config.upstream.endpoint);

    let fetcher = Arc::new(config.build_fetcher().context("Failed to build HTTP client")?);
    let dispatcher = Arc::new(Dispatcher::new(fetcher));
    tracing::info!(
        "Ready: tools {:?}, resources {:?}",
        dispatcher.tool_names(),
        dispatcher.resource_uris()
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    match args.transport {
        Transport::Stdio => {
            let server = McpServer::new(dispatcher);
            tokio::select! {
                result = server.start() => result.context("stdio transport failed")?,
                _ = shutdown.cancelled() => {}
            }
        }
        Transport::Sse => {
            let addr = format!("{}:{}", args.host, args.port);
            api::serve(&addr, AppState::new(dispatcher, shutdown)).await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Cancel `token` on the first SIGINT or SIGTERM
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
    token.cancel();
}

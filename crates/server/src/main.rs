use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kirha_mcp::McpServer;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info};

mod config;
mod providers;

use config::{HttpArgs, KirhaArgs, LogArgs};

/// How long in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(30);

/// How long runtime threads get to wind down once the server has returned.
const RUNTIME_RELEASE: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "kirha-mcp-gateway", version)]
#[command(about = "MCP gateway to the Kirha tool catalog", long_about = None)]
struct Cli {
    #[command(flatten)]
    logs: LogArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve MCP over HTTP
    Http {
        #[command(flatten)]
        kirha: KirhaArgs,

        #[command(flatten)]
        http: HttpArgs,
    },
    /// Serve MCP over stdin/stdout
    Stdio {
        #[command(flatten)]
        kirha: KirhaArgs,
    },
}

fn main() -> Result<()> {
    load_dotenv()?;

    let cli = Cli::parse();
    if cli.logs.enable_logs {
        init_logging();
    }

    block_on_and_release(serve(cli.command))
}

async fn serve(command: Command) -> Result<()> {
    let server = match &command {
        Command::Http { kirha, http } => {
            info!(port = http.port, path = %http.path, "Starting HTTP MCP server...");
            providers::provide_http_server(kirha, http)
        }
        Command::Stdio { kirha } => {
            info!("Starting stdio MCP server...");
            providers::provide_stdio_server(kirha)
        }
    }
    .inspect_err(|e| error!(error = %format!("{:#}", e), "Failed to initialize server"))?;

    run(server).await
}

/// Drive `future` on a fresh runtime, then give runtime threads a bounded
/// time to finish. The stdin reader blocks in a pool thread that cannot be
/// interrupted and would otherwise keep the process alive until EOF.
fn block_on_and_release<F>(future: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let result = runtime.block_on(future);
    runtime.shutdown_timeout(RUNTIME_RELEASE);
    result
}

/// Load `.env` from the working directory. A missing file is fine.
fn load_dotenv() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("failed to load .env file"),
    }
}

/// JSON logs on stderr; stdout belongs to the stdio transport.
fn init_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with_writer(std::io::stderr)
        .with_current_span(true)
        .init();
}

/// Serve until the transport ends or a shutdown signal arrives.
async fn run(server: McpServer) -> Result<()> {
    let server = Arc::new(server);
    let (served_tx, served_rx) = oneshot::channel::<()>();

    let stopper = {
        let server = server.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_signal() => {
                    info!("Received shutdown signal");
                    if let Err(e) = server.stop(SHUTDOWN_DEADLINE).await {
                        error!(error = %e, "Failed to shutdown server gracefully");
                    }
                    info!("Server shutdown complete");
                }
                _ = served_rx => {}
            }
        })
    };

    let result = server.start().await;
    drop(served_tx);

    if let Err(e) = stopper.await {
        error!(error = %e, "shutdown task failed");
    }

    match result {
        Ok(()) => {
            info!("Server stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Server error");
            Err(e)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for SIGINT");
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
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

// MCP server lifecycle

use crate::dispatch::Dispatcher;
use crate::handler::ToolsHandler;
use crate::transport::Transport;
use anyhow::Result;
use kirha_core::ToolApplication;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Starting,
    Serving,
    Stopping,
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("server already started")]
    AlreadyStarted,

    #[error("server did not stop within {0:?}")]
    StopTimeout(Duration),
}

/// Ties a [`ToolApplication`] to a [`Transport`].
///
/// Start once, stop any number of times. Stopping closes the transport to new
/// work and waits for in-flight requests; at the deadline they are cancelled.
pub struct McpServer {
    app: Arc<ToolApplication>,
    transport: Arc<dyn Transport>,
    state: watch::Sender<ServerState>,
    shutdown: CancellationToken,
    abort: CancellationToken,
    span: Span,
}

impl McpServer {
    pub fn new(app: Arc<ToolApplication>, transport: Arc<dyn Transport>) -> Self {
        let (state, _) = watch::channel(ServerState::Idle);
        Self {
            app,
            transport,
            state,
            shutdown: CancellationToken::new(),
            abort: CancellationToken::new(),
            span: tracing::info_span!("mcp_server"),
        }
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Serve until the transport finishes or [`McpServer::stop`] is called.
    pub async fn start(&self) -> Result<()> {
        async {
            let claimed = self.state.send_if_modified(|state| {
                if *state == ServerState::Idle {
                    *state = ServerState::Starting;
                    true
                } else {
                    false
                }
            });
            if !claimed {
                return Err(ServerError::AlreadyStarted.into());
            }

            info!(transport = self.transport.name(), "starting MCP server");

            let handler = Arc::new(ToolsHandler::new(self.app.clone()));
            let dispatcher = Arc::new(Dispatcher::new(handler));

            self.state.send_if_modified(|state| {
                if *state == ServerState::Starting {
                    *state = ServerState::Serving;
                    true
                } else {
                    false
                }
            });

            let result = self
                .transport
                .serve(dispatcher, self.shutdown.clone(), self.abort.clone())
                .await;

            self.state.send_replace(ServerState::Stopped);
            match &result {
                Ok(()) => info!("MCP server stopped"),
                Err(e) => error!(error = %e, "MCP server failed"),
            }
            result
        }
        .instrument(self.span.clone())
        .await
    }

    /// Stop accepting work and wait up to `deadline` for in-flight requests.
    ///
    /// A no-op when the server never started or already stopped.
    pub async fn stop(&self, deadline: Duration) -> Result<()> {
        async {
            if matches!(self.state(), ServerState::Idle | ServerState::Stopped) {
                debug!("stop requested but server is not running");
                return Ok(());
            }

            self.state.send_if_modified(|state| {
                if matches!(*state, ServerState::Starting | ServerState::Serving) {
                    *state = ServerState::Stopping;
                    true
                } else {
                    false
                }
            });

            info!(deadline = ?deadline, "stopping MCP server");
            self.shutdown.cancel();

            let mut state = self.state.subscribe();
            if tokio::time::timeout(deadline, state.wait_for(|s| *s == ServerState::Stopped))
                .await
                .is_ok()
            {
                return Ok(());
            }

            warn!("shutdown deadline exceeded, cancelling in-flight requests");
            self.abort.cancel();
            Err(ServerError::StopTimeout(deadline).into())
        }
        .instrument(self.span.clone())
        .await
    }
}

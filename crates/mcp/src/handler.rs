// MCP tool handler: protocol adapter over the tool application

use crate::convert;
use crate::protocol::{CallToolResult, JsonRpcError, ToolSchema};
use kirha_core::{Arguments, ToolApplication};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument, Span};

/// Protocol-level failure with a fixed description and the underlying cause.
#[derive(Debug)]
pub struct ProtocolError {
    pub code: i32,
    pub message: &'static str,
    pub cause: anyhow::Error,
}

impl ProtocolError {
    pub fn internal(message: &'static str, cause: anyhow::Error) -> Self {
        Self {
            code: JsonRpcError::INTERNAL_ERROR,
            message,
            cause,
        }
    }

    /// JSON-RPC error for the wire; the cause travels in `data`.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.code,
            message: self.message.to_string(),
            data: Some(serde_json::Value::String(format!("{:#}", self.cause))),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.cause)
    }
}

/// Tool operations exposed to protocol clients.
#[async_trait::async_trait]
pub trait ToolAggregator: Send + Sync {
    async fn list_tools(&self, cancel: &CancellationToken) -> Result<Vec<ToolSchema>, ProtocolError>;

    async fn execute_tool(
        &self,
        name: &str,
        arguments: Arguments,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, ProtocolError>;
}

/// Translates between the MCP wire types and [`ToolApplication`].
pub struct ToolsHandler {
    app: Arc<ToolApplication>,
    span: Span,
}

impl ToolsHandler {
    pub fn new(app: Arc<ToolApplication>) -> Self {
        Self {
            app,
            span: tracing::info_span!("mcp_handler"),
        }
    }
}

#[async_trait::async_trait]
impl ToolAggregator for ToolsHandler {
    async fn list_tools(&self, cancel: &CancellationToken) -> Result<Vec<ToolSchema>, ProtocolError> {
        async {
            info!("handling list tools request");

            let tools = self.app.list_tools(cancel).await.map_err(|e| {
                error!(error = %e, "failed to list tools");
                ProtocolError::internal("failed to list tools", e)
            })?;

            info!(count = tools.len(), "successfully handled list tools request");
            Ok(convert::to_wire_tools(&tools))
        }
        .instrument(self.span.clone())
        .await
    }

    async fn execute_tool(
        &self,
        name: &str,
        arguments: Arguments,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, ProtocolError> {
        async {
            info!(tool_name = name, "handling execute tool request");

            let result = self
                .app
                .execute_tool(name, arguments, cancel)
                .await
                .map_err(|e| {
                    error!(tool_name = name, error = %e, "failed to execute tool");
                    ProtocolError::internal("failed to execute tool", e)
                })?;

            info!(tool_name = name, "successfully handled execute tool request");
            Ok(convert::to_wire_result(result))
        }
        .instrument(self.span.clone())
        .await
    }
}

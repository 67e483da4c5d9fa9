// Tool use cases on top of a remote tool provider

use crate::error::GatewayError;
use crate::provider::ToolProvider;
use crate::types::{Arguments, Tool, ToolExecutionResult};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument, Span};

/// Lists and executes tools through a [`ToolProvider`].
///
/// A remotely reported failure is never handed back as a success-shaped
/// value: `success == false` becomes [`GatewayError::ToolExecutionFailed`].
pub struct ToolApplication {
    provider: Arc<dyn ToolProvider>,
    span: Span,
}

impl std::fmt::Debug for ToolApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolApplication").finish_non_exhaustive()
    }
}

impl ToolApplication {
    pub fn new(provider: Arc<dyn ToolProvider>) -> Self {
        Self {
            provider,
            span: tracing::info_span!("gateway_application"),
        }
    }

    /// List all tools available for the configured vertical.
    pub async fn list_tools(&self, cancel: &CancellationToken) -> Result<Vec<Tool>> {
        async {
            info!("listing tools from Kirha API");

            let tools = self
                .provider
                .list_tools(cancel)
                .await
                .inspect_err(|e| error!(error = %e, "failed to list tools from Kirha API"))
                .context("failed to list tools")?;

            info!(count = tools.len(), "successfully listed tools from Kirha API");
            Ok(tools)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Execute a tool and return its result only if the tool reported success.
    pub async fn execute_tool(
        &self,
        name: &str,
        arguments: Arguments,
        cancel: &CancellationToken,
    ) -> Result<ToolExecutionResult> {
        async {
            info!(tool_name = name, "executing tool");

            let result = match self.provider.execute_tool(name, arguments, cancel).await {
                Ok(result) => result,
                Err(e) => {
                    error!(tool_name = name, error = %e, "failed to execute tool");
                    return Err(e.into());
                }
            };

            if !result.success {
                error!(
                    tool_name = name,
                    error = result.error_message(),
                    "tool execution failed"
                );
                return Err(GatewayError::ToolExecutionFailed.into());
            }

            info!(
                tool_name = name,
                duration_ms = result.duration.as_millis() as u64,
                "tool executed successfully"
            );
            Ok(result)
        }
        .instrument(self.span.clone())
        .await
    }
}

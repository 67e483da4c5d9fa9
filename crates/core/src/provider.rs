// Capability the gateway needs from a remote tool provider

use crate::error::{ExecuteError, GatewayResult};
use crate::types::{Arguments, Tool, ToolExecutionResult};
use tokio_util::sync::CancellationToken;

/// Remote tool provider.
///
/// Cancelling `cancel` aborts the in-flight call; implementations report it as
/// [`GatewayError::NetworkTimeout`](crate::GatewayError::NetworkTimeout).
#[async_trait::async_trait]
pub trait ToolProvider: Send + Sync {
    /// Fetch the tool catalog. Every call hits the remote API.
    async fn list_tools(&self, cancel: &CancellationToken) -> GatewayResult<Vec<Tool>>;

    /// Execute a tool by name.
    async fn execute_tool(
        &self,
        name: &str,
        arguments: Arguments,
        cancel: &CancellationToken,
    ) -> Result<ToolExecutionResult, ExecuteError>;
}

// JSON-RPC method routing for MCP sessions

use crate::handler::ToolAggregator;
use crate::protocol::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Name announced to MCP clients.
pub const SERVER_NAME: &str = "Kirha MCP";

/// Instructions announced to MCP clients.
pub const SERVER_INSTRUCTIONS: &str = "Gateway to premium data providers for real time insights";

/// Routes decoded JSON-RPC requests to a [`ToolAggregator`].
///
/// Transport agnostic: stdio and HTTP both feed raw messages through
/// [`Dispatcher::handle_message`].
pub struct Dispatcher {
    tools: Arc<dyn ToolAggregator>,
    server_info: ServerInfo,
    instructions: String,
}

impl Dispatcher {
    pub fn new(tools: Arc<dyn ToolAggregator>) -> Self {
        Self {
            tools,
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: SERVER_INSTRUCTIONS.to_string(),
        }
    }

    /// Decode one message. A malformed message yields the error response to send back.
    pub fn parse(raw: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
        serde_json::from_str(raw).map_err(|e| {
            warn!(error = %e, "failed to parse JSON-RPC message");
            JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error())
        })
    }

    /// Decode and handle one raw message. `None` means nothing is sent back.
    pub async fn handle_message(
        &self,
        raw: &str,
        cancel: &CancellationToken,
    ) -> Option<JsonRpcResponse> {
        match Self::parse(raw) {
            Ok(request) => self.handle(request, cancel).await,
            Err(response) => Some(response),
        }
    }

    pub async fn handle(
        &self,
        request: JsonRpcRequest,
        cancel: &CancellationToken,
    ) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "received notification");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
            ));
        }

        debug!(method = %request.method, "handling request");

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => self.list_tools(cancel).await,
            "tools/call" => self.call_tool(request.params, cancel).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let requested = params
            .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok())
            .map(|p| p.protocol_version)
            .filter(|v| !v.is_empty());

        if let Some(version) = &requested {
            debug!(protocol_version = %version, "client requested protocol version");
        }

        let result = InitializeResult {
            protocol_version: requested.unwrap_or_else(|| PROTOCOL_VERSION.to_string()),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: self.server_info.clone(),
            instructions: Some(self.instructions.clone()),
        };

        to_value(&result)
    }

    async fn list_tools(&self, cancel: &CancellationToken) -> Result<Value, JsonRpcError> {
        let tools = self
            .tools
            .list_tools(cancel)
            .await
            .map_err(|e| e.to_rpc_error())?;

        to_value(&ListToolsResult { tools })
    }

    async fn call_tool(
        &self,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("missing params"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| JsonRpcError::invalid_params(format!("invalid params: {}", e)))
            })?;

        let result = self
            .tools
            .execute_tool(&params.name, params.arguments.unwrap_or_default(), cancel)
            .await
            .map_err(|e| e.to_rpc_error())?;

        to_value(&result)
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

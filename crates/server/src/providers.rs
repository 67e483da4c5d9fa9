// Composition roots

use crate::config::{HttpArgs, KirhaArgs};
use anyhow::{Context, Result};
use kirha_client::KirhaClient;
use kirha_core::ToolApplication;
use kirha_mcp::{HttpTransport, McpServer, StdioTransport};
use std::sync::Arc;

pub fn provide_tool_application(kirha: &KirhaArgs) -> Result<Arc<ToolApplication>> {
    let client = KirhaClient::new(kirha.client_config()).context("failed to create Kirha client")?;
    Ok(Arc::new(ToolApplication::new(Arc::new(client))))
}

/// Server speaking MCP over the process's stdin and stdout.
pub fn provide_stdio_server(kirha: &KirhaArgs) -> Result<McpServer> {
    let app = provide_tool_application(kirha)?;
    Ok(McpServer::new(app, Arc::new(StdioTransport::new())))
}

pub fn provide_http_server(kirha: &KirhaArgs, http: &HttpArgs) -> Result<McpServer> {
    let app = provide_tool_application(kirha)?;
    let transport = HttpTransport::new(http.transport_config());
    Ok(McpServer::new(app, Arc::new(transport)))
}

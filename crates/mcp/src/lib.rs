// MCP (Model Context Protocol) side of the Kirha gateway.
// Exposes the tool application to agent clients over stdio or HTTP.

pub mod convert;
pub mod dispatch;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod transport;

pub use dispatch::Dispatcher;
pub use handler::{ProtocolError, ToolAggregator, ToolsHandler};
pub use server::{McpServer, ServerError, ServerState};
pub use transport::{HttpTransport, HttpTransportConfig, StdioTransport, Transport};

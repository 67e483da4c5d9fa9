// Core types and use cases for the Kirha MCP gateway

pub mod app;
pub mod error;
pub mod provider;
pub mod types;

pub use app::ToolApplication;
pub use error::{gateway_error, ExecuteError, GatewayError, GatewayResult};
pub use provider::ToolProvider;
pub use types::*;

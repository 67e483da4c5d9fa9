//! Transports carrying JSON-RPC messages between MCP clients and the dispatcher.

pub mod http;
pub mod stdio;

pub use http::{HttpTransport, HttpTransportConfig};
pub use stdio::StdioTransport;

use crate::dispatch::Dispatcher;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A way of serving MCP sessions.
///
/// `serve` returns once `shutdown` is cancelled and in-flight requests have
/// drained. Cancelling `abort` cancels those in-flight requests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn serve(
        &self,
        dispatcher: Arc<Dispatcher>,
        shutdown: CancellationToken,
        abort: CancellationToken,
    ) -> anyhow::Result<()>;
}

// Newline-delimited JSON-RPC over stdin/stdout

use super::Transport;
use crate::dispatch::Dispatcher;
use crate::protocol::{JsonRpcError, JsonRpcResponse};
use anyhow::anyhow;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, Mutex};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

type Reader = Box<dyn AsyncRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Serves a single MCP session over a pair of byte streams, one JSON message
/// per line.
///
/// Requests are handled concurrently; responses are written by a single task
/// so lines never interleave.
pub struct StdioTransport {
    io: Mutex<Option<(Reader, Writer)>>,
}

impl StdioTransport {
    /// Transport over the process's stdin and stdout.
    pub fn new() -> Self {
        Self::with_io(tokio::io::stdin(), tokio::io::stdout())
    }

    pub fn with_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            io: Mutex::new(Some((Box::new(reader), Box::new(writer)))),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for StdioTransport {
    fn name(&self) -> &'static str {
        "stdio"
    }

    async fn serve(
        &self,
        dispatcher: Arc<Dispatcher>,
        shutdown: CancellationToken,
        abort: CancellationToken,
    ) -> anyhow::Result<()> {
        let (reader, writer) = self
            .io
            .lock()
            .await
            .take()
            .ok_or_else(|| anyhow!("stdio transport can only be served once"))?;

        let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            let mut sink = FramedWrite::new(writer, LinesCodec::new());
            while let Some(line) = rx.recv().await {
                if let Err(e) = sink.send(line).await {
                    error!(error = %e, "failed to write response");
                    break;
                }
            }
        });

        let tracker = TaskTracker::new();
        info!("stdio transport serving");

        loop {
            let line = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("stdio transport shutting down");
                    break;
                }
                next = lines.next() => match next {
                    Some(Ok(line)) => line,
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        warn!("dropping oversized message");
                        send(&tx, &JsonRpcResponse::error(serde_json::Value::Null, JsonRpcError::parse_error()));
                        continue;
                    }
                    Some(Err(LinesCodecError::Io(e))) => {
                        error!(error = %e, "failed to read from stdin");
                        break;
                    }
                    None => {
                        info!("stdin closed");
                        break;
                    }
                },
            };

            if line.trim().is_empty() {
                continue;
            }

            let dispatcher = dispatcher.clone();
            let tx = tx.clone();
            let cancel = abort.child_token();
            tracker.spawn(async move {
                if let Some(response) = dispatcher.handle_message(&line, &cancel).await {
                    send(&tx, &response);
                }
            });
        }

        tracker.close();
        debug!(in_flight = tracker.len(), "waiting for in-flight requests");
        tracker.wait().await;

        drop(tx);
        writer_task
            .await
            .map_err(|e| anyhow!("stdio writer task failed: {}", e))?;

        info!("stdio transport stopped");
        Ok(())
    }
}

fn send(tx: &mpsc::UnboundedSender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(line) => {
            if tx.send(line).is_err() {
                warn!("response dropped, writer is gone");
            }
        }
        Err(e) => error!(error = %e, "failed to serialize response"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{ProtocolError, ToolAggregator};
    use crate::protocol::{CallToolResult, InputSchema, ToolContent, ToolSchema};
    use kirha_core::Arguments;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

    struct SlowTools {
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl ToolAggregator for SlowTools {
        async fn list_tools(
            &self,
            _cancel: &CancellationToken,
        ) -> Result<Vec<ToolSchema>, ProtocolError> {
            Ok(vec![ToolSchema {
                name: "weather".to_string(),
                description: String::new(),
                input_schema: InputSchema::default(),
            }])
        }

        async fn execute_tool(
            &self,
            name: &str,
            _arguments: Arguments,
            _cancel: &CancellationToken,
        ) -> Result<CallToolResult, ProtocolError> {
            tokio::time::sleep(self.delay).await;
            Ok(CallToolResult {
                content: vec![ToolContent::text(format!("ran {}", name))],
                is_error: false,
            })
        }
    }

    fn session(delay: Duration) -> (StdioTransport, Arc<Dispatcher>, DuplexStream) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(server);
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(SlowTools { delay })));
        (StdioTransport::with_io(reader, writer), dispatcher, client)
    }

    async fn read_responses(client: DuplexStream) -> Vec<Value> {
        let mut lines = BufReader::new(client).lines();
        let mut out = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            out.push(serde_json::from_str(&line).unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_serves_until_eof() {
        let (transport, dispatcher, mut client) = session(Duration::ZERO);

        client
            .write_all(
                concat!(
                    r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#,
                    "\n",
                    r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                    "\n\n",
                    r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
                    "\n",
                    "garbage\n",
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        client.shutdown().await.unwrap();

        transport
            .serve(dispatcher, CancellationToken::new(), CancellationToken::new())
            .await
            .unwrap();

        let mut responses = read_responses(client).await;
        assert_eq!(responses.len(), 3);

        responses.sort_by_key(|r| r["id"].as_i64().unwrap_or(-1));
        assert_eq!(responses[0]["error"]["code"], json!(JsonRpcError::PARSE_ERROR));
        assert_eq!(responses[1]["result"]["serverInfo"]["name"], json!("Kirha MCP"));
        assert_eq!(responses[2]["result"]["tools"][0]["name"], json!("weather"));
    }

    #[tokio::test]
    async fn test_shutdown_drains_in_flight_requests() {
        let (transport, dispatcher, mut client) = session(Duration::from_millis(100));
        let shutdown = CancellationToken::new();

        client
            .write_all(
                b"{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"tools/call\",\"params\":{\"name\":\"slow\"}}\n",
            )
            .await
            .unwrap();

        let serving = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                transport
                    .serve(dispatcher, shutdown, CancellationToken::new())
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();
        serving.await.unwrap().unwrap();

        let mut lines = BufReader::new(client).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let response: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(response["id"], json!(9));
        assert_eq!(response["result"]["content"][0]["text"], json!("ran slow"));
    }

    #[tokio::test]
    async fn test_serve_twice_fails() {
        let (transport, dispatcher, client) = session(Duration::ZERO);
        drop(client);

        transport
            .serve(dispatcher.clone(), CancellationToken::new(), CancellationToken::new())
            .await
            .unwrap();

        let err = transport
            .serve(dispatcher, CancellationToken::new(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("only be served once"));
    }
}

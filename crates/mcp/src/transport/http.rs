// JSON-RPC over HTTP POST

use super::Transport;
use crate::dispatch::Dispatcher;
use crate::protocol::{JsonRpcError, JsonRpcResponse};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn};

/// Default endpoint for MCP messages.
pub const DEFAULT_PATH: &str = "/mcp";

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub addr: SocketAddr,
    pub path: String,
    /// Upper bound on handling a single request.
    pub response_timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8022)),
            path: DEFAULT_PATH.to_string(),
            response_timeout: Duration::from_secs(120),
        }
    }
}

/// Serves MCP over HTTP: one JSON-RPC message per `POST`, any origin allowed.
pub struct HttpTransport {
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Self {
        Self { config }
    }
}

struct HttpState {
    dispatcher: Arc<Dispatcher>,
    response_timeout: Duration,
    abort: CancellationToken,
}

/// Build the MCP router. Requests in flight are cancelled through `abort`.
pub fn router(
    dispatcher: Arc<Dispatcher>,
    config: &HttpTransportConfig,
    abort: CancellationToken,
) -> Router {
    let state = HttpState {
        dispatcher,
        response_timeout: config.response_timeout,
        abort,
    };

    Router::new()
        .route(&config.path, post(handle_message))
        .route("/health", get(health_check))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn serve(
        &self,
        dispatcher: Arc<Dispatcher>,
        shutdown: CancellationToken,
        abort: CancellationToken,
    ) -> Result<()> {
        let app = router(dispatcher, &self.config, abort);

        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.addr))?;
        info!(
            addr = %listener.local_addr()?,
            path = %self.config.path,
            "HTTP transport listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled_owned().await })
            .await
            .context("HTTP transport failed")?;

        info!("HTTP transport stopped");
        Ok(())
    }
}

async fn handle_message(State(state): State<Arc<HttpState>>, body: String) -> Response {
    let request = match Dispatcher::parse(&body) {
        Ok(request) => request,
        Err(response) => return Json(response).into_response(),
    };

    let cancel = state.abort.child_token();

    if request.is_notification() {
        state.dispatcher.handle(request, &cancel).await;
        return StatusCode::ACCEPTED.into_response();
    }

    let id = request.id.clone().unwrap_or(serde_json::Value::Null);
    let method = request.method.clone();

    match tokio::time::timeout(state.response_timeout, state.dispatcher.handle(request, &cancel)).await {
        Ok(Some(response)) => Json(response).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(_) => {
            cancel.cancel();
            warn!(method = %method, timeout = ?state.response_timeout, "request timed out");
            Json(JsonRpcResponse::error(
                id,
                JsonRpcError::internal_error("request timed out"),
            ))
            .into_response()
        }
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "kirha-mcp",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{ProtocolError, ToolAggregator};
    use crate::protocol::{CallToolResult, ToolContent, ToolSchema};
    use axum::body::Body;
    use axum::http::Request;
    use kirha_core::Arguments;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct SleepyTools;

    #[async_trait::async_trait]
    impl ToolAggregator for SleepyTools {
        async fn list_tools(
            &self,
            _cancel: &CancellationToken,
        ) -> Result<Vec<ToolSchema>, ProtocolError> {
            Ok(Vec::new())
        }

        async fn execute_tool(
            &self,
            name: &str,
            _arguments: Arguments,
            cancel: &CancellationToken,
        ) -> Result<CallToolResult, ProtocolError> {
            if name == "fast" {
                tokio::time::sleep(Duration::from_millis(800)).await;
                return Ok(CallToolResult {
                    content: vec![ToolContent::text(format!("cancelled={}", cancel.is_cancelled()))],
                    is_error: false,
                });
            }
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(CallToolResult {
                content: vec![ToolContent::text("late")],
                is_error: false,
            })
        }
    }

    fn app() -> Router {
        let config = HttpTransportConfig {
            response_timeout: Duration::from_secs(1),
            ..Default::default()
        };
        router(
            Arc::new(Dispatcher::new(Arc::new(SleepyTools))),
            &config,
            CancellationToken::new(),
        )
    }

    fn post_json(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_tools_list() {
        let response = app()
            .oneshot(post_json(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], json!(1));
        assert_eq!(body["result"], json!({"tools": []}));
    }

    #[tokio::test]
    async fn test_notification_accepted() {
        let response = app()
            .oneshot(post_json(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let response = app().oneshot(post_json("{oops")).await.unwrap();

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], json!(JsonRpcError::PARSE_ERROR));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let response = app()
            .oneshot(post_json(
                r#"{"jsonrpc":"2.0","id":"slow","method":"tools/call","params":{"name":"x"}}"#,
            ))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["id"], json!("slow"));
        assert_eq!(body["error"]["code"], json!(JsonRpcError::INTERNAL_ERROR));
        assert_eq!(body["error"]["message"], json!("request timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_leaves_concurrent_call_running() {
        let app = app();

        // The fast call starts before the slow one times out and ends after it.
        let slow = app.clone().oneshot(post_json(
            r#"{"jsonrpc":"2.0","id":"slow","method":"tools/call","params":{"name":"slow"}}"#,
        ));
        let fast = async {
            tokio::time::sleep(Duration::from_millis(600)).await;
            app.clone()
                .oneshot(post_json(
                    r#"{"jsonrpc":"2.0","id":"fast","method":"tools/call","params":{"name":"fast"}}"#,
                ))
                .await
        };

        let (slow, fast) = tokio::join!(slow, fast);

        let slow = body_json(slow.unwrap()).await;
        assert_eq!(slow["error"]["message"], json!("request timed out"));

        let fast = body_json(fast.unwrap()).await;
        assert_eq!(fast["id"], json!("fast"));
        assert!(fast.get("error").is_none());
        assert_eq!(fast["result"]["content"][0]["text"], json!("cancelled=false"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], json!("ok"));
    }

    #[tokio::test]
    async fn test_unknown_path_not_found() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/other")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let transport = HttpTransport::new(HttpTransportConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Default::default()
        });
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        transport
            .serve(
                Arc::new(Dispatcher::new(Arc::new(SleepyTools))),
                shutdown,
                CancellationToken::new(),
            )
            .await
            .unwrap();
    }
}

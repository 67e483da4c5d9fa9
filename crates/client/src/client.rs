//! Remote tool client for the Kirha API.

use crate::config::ClientConfig;
use crate::types::{ExecuteToolRequest, ExecuteToolResponse, ListToolsResponse};
use anyhow::Context;
use kirha_core::{
    Arguments, ExecuteError, GatewayError, GatewayResult, Tool, ToolExecutionResult, ToolProvider,
};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument, Span};
use url::Url;

/// Page size requested from the catalog endpoint.
const LIST_LIMIT: &str = "99";

/// Why a request did not produce a response (or a complete body).
#[derive(Debug, thiserror::Error)]
enum RequestError {
    #[error("request cancelled")]
    Cancelled,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// HTTP implementation of [`ToolProvider`].
///
/// Holds a single connection pool that is shared by all in-flight requests.
#[derive(Debug, Clone)]
pub struct KirhaClient {
    http: Client,
    config: ClientConfig,
    span: Span,
}

impl KirhaClient {
    /// Create a client, validating the configuration first.
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .context("Invalid API key format")?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            config,
            span: tracing::info_span!("kirha_client"),
        })
    }

    /// Build an endpoint URL below the base URL.
    fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                error!(base_url = %self.config.base_url, "base URL cannot hold a path");
                GatewayError::InternalServer
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn list_url(&self) -> GatewayResult<Url> {
        let mut url = self.endpoint(&["mcp", "v1", "tools"])?;
        url.query_pairs_mut()
            .append_pair("limit", LIST_LIMIT)
            .append_pair("vertical_id", &self.config.vertical_id);
        Ok(url)
    }

    fn execute_url(&self, name: &str) -> GatewayResult<Url> {
        self.endpoint(&["mcp", "v1", "tools", name, "execute"])
    }

    /// Send a request unless the caller cancels first.
    async fn send(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response, RequestError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RequestError::Cancelled),
            response = request.send() => response.map_err(RequestError::from),
        }
    }

    /// Read and decode a response body unless the caller cancels first.
    async fn decode<T: DeserializeOwned>(
        &self,
        response: Response,
        cancel: &CancellationToken,
    ) -> anyhow::Result<T> {
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RequestError::Cancelled),
            body = response.bytes() => body.map_err(RequestError::from),
        }?;

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait::async_trait]
impl ToolProvider for KirhaClient {
    async fn list_tools(&self, cancel: &CancellationToken) -> GatewayResult<Vec<Tool>> {
        async {
            let url = self.list_url()?;
            debug!(url = %url, "GET request");

            let response = self.send(self.http.get(url), cancel).await.map_err(|e| {
                error!(error = %e, "failed to execute request");
                GatewayError::NetworkTimeout
            })?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                error!(status_code = status.as_u16(), "unauthorized request");
                return Err(GatewayError::Unauthorized);
            }

            if status.is_client_error() || status.is_server_error() {
                error!(status_code = status.as_u16(), "API error");
                return Err(GatewayError::InternalServer);
            }

            let response: ListToolsResponse =
                self.decode(response, cancel).await.map_err(|e| {
                    error!(error = %e, "failed to decode response");
                    GatewayError::InvalidResponse
                })?;

            if let Some(cursor) = &response.next_cursor {
                debug!(next_cursor = %cursor, "catalog has more pages, not followed");
            }

            let tools: Vec<Tool> = response.tools.into_iter().map(Tool::from).collect();

            info!(count = tools.len(), "successfully listed tools");
            Ok(tools)
        }
        .instrument(self.span.clone())
        .await
    }

    async fn execute_tool(
        &self,
        name: &str,
        arguments: Arguments,
        cancel: &CancellationToken,
    ) -> Result<ToolExecutionResult, ExecuteError> {
        async {
            let started = Instant::now();

            let url = self.execute_url(name)?;
            let body = serde_json::to_vec(&ExecuteToolRequest {
                arguments: &arguments,
            })
            .map_err(|e| {
                error!(error = %e, tool = name, "failed to marshal request body");
                GatewayError::InvalidArguments
            })?;
            debug!(url = %url, tool = name, "POST request");

            let response = match self.send(self.http.post(url).body(body), cancel).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, tool = name, "failed to execute request");
                    let result = ToolExecutionResult::failed(name, e.to_string(), started.elapsed());
                    return Err(ExecuteError::with_result(GatewayError::NetworkTimeout, result));
                }
            };

            let status = response.status();
            let failure = match status {
                StatusCode::UNAUTHORIZED => {
                    error!(status_code = status.as_u16(), tool = name, "unauthorized request");
                    Some((GatewayError::Unauthorized, "unauthorized".to_string()))
                }
                StatusCode::NOT_FOUND => {
                    error!(tool = name, "tool not found");
                    Some((GatewayError::ToolNotFound, "tool not found".to_string()))
                }
                s if s.is_client_error() || s.is_server_error() => {
                    error!(status_code = s.as_u16(), tool = name, "API error");
                    Some((
                        GatewayError::ToolExecutionFailed,
                        format!("API error: {}", s.as_u16()),
                    ))
                }
                _ => None,
            };

            if let Some((kind, message)) = failure {
                let result = ToolExecutionResult::failed(name, message, started.elapsed());
                return Err(ExecuteError::with_result(kind, result));
            }

            let response: ExecuteToolResponse = match self.decode(response, cancel).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, tool = name, "failed to decode response");
                    let result = ToolExecutionResult::failed(name, "invalid response", started.elapsed());
                    return Err(ExecuteError::with_result(GatewayError::InvalidResponse, result));
                }
            };

            let duration = started.elapsed();
            info!(
                tool = name,
                duration_ms = duration.as_millis() as u64,
                "successfully executed tool"
            );
            Ok(ToolExecutionResult::succeeded(
                name,
                response.result.unwrap_or_default(),
                duration,
            ))
        }
        .instrument(self.span.clone())
        .await
    }
}

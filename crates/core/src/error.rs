//! Error taxonomy shared by every layer of the gateway.

use crate::types::ToolExecutionResult;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Closed set of failure kinds.
///
/// The remote client is the only place that turns transport and HTTP outcomes
/// into one of these; the layers above forward them untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum GatewayError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("tool not found")]
    ToolNotFound,

    #[error("tool execution failed")]
    ToolExecutionFailed,

    #[error("invalid arguments")]
    InvalidArguments,

    #[error("internal server error")]
    InternalServer,

    #[error("invalid timeout configuration")]
    InvalidTimeout,

    #[error("network timeout")]
    NetworkTimeout,

    #[error("invalid response from API")]
    InvalidResponse,

    #[error("API key is missing")]
    ApiKeyMissing,

    #[error("vertical ID is missing")]
    VerticalMissing,
}

/// Failure of a single tool execution.
///
/// Carries the partially populated result whenever the request got far enough
/// to measure it, so callers can still report duration and timestamp.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}")]
pub struct ExecuteError {
    pub kind: GatewayError,
    pub result: Option<ToolExecutionResult>,
}

impl ExecuteError {
    /// Failure that happened before any request was sent.
    pub fn without_result(kind: GatewayError) -> Self {
        Self { kind, result: None }
    }

    pub fn with_result(kind: GatewayError, result: ToolExecutionResult) -> Self {
        Self {
            kind,
            result: Some(result),
        }
    }
}

impl From<GatewayError> for ExecuteError {
    fn from(kind: GatewayError) -> Self {
        Self::without_result(kind)
    }
}

/// Find the taxonomy kind anywhere in an error chain.
pub fn gateway_error(err: &anyhow::Error) -> Option<GatewayError> {
    err.chain().find_map(|cause| {
        if let Some(kind) = cause.downcast_ref::<GatewayError>() {
            return Some(*kind);
        }
        cause.downcast_ref::<ExecuteError>().map(|e| e.kind)
    })
}

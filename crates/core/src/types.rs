use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Keyed arguments passed to a tool execution.
pub type Arguments = serde_json::Map<String, serde_json::Value>;

/// A catalog entry describing a remotely invocable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    /// Slug used as the externally visible name
    pub identifier: String,
    /// Display name
    pub name: String,
    pub description: String,
    pub mcp_id: String,
    #[serde(default)]
    pub vertical_ids: Vec<String>,
    /// Parameter schema, passed through untouched
    #[serde(default)]
    pub parameters: serde_json::Value,
    /// Output schema, passed through untouched
    #[serde(default)]
    pub outputs: serde_json::Value,
}

impl Tool {
    /// Name exposed to protocol clients: the slug, or the display name when
    /// the slug is empty.
    pub fn public_name(&self) -> &str {
        if self.identifier.is_empty() {
            &self.name
        } else {
            &self.identifier
        }
    }
}

/// Outcome of one tool execution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionResult {
    pub tool_name: String,
    /// Present only when the execution succeeded
    pub result: Option<Arguments>,
    pub success: bool,
    /// Present only when the execution failed
    pub error: Option<String>,
    pub duration: Duration,
    pub timestamp: DateTime<Utc>,
}

impl ToolExecutionResult {
    pub fn succeeded(tool_name: impl Into<String>, result: Arguments, duration: Duration) -> Self {
        Self {
            tool_name: tool_name.into(),
            result: Some(result),
            success: true,
            error: None,
            duration,
            timestamp: Utc::now(),
        }
    }

    /// A failed attempt. An empty message is replaced so that a failure never
    /// reads as error-free.
    pub fn failed(tool_name: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        let mut error = error.into();
        if error.is_empty() {
            error = "unknown error".to_string();
        }

        Self {
            tool_name: tool_name.into(),
            result: None,
            success: false,
            error: Some(error),
            duration,
            timestamp: Utc::now(),
        }
    }

    /// Error message, empty on success.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or_default()
    }
}

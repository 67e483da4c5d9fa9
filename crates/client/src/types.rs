//! Request and response bodies of the Kirha API.

use kirha_core::{Arguments, Tool};
use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `GET /mcp/v1/tools` response.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListToolsResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub tools: Vec<ToolResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub identifier: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mcp_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub vertical_ids: Vec<String>,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub parameters: serde_json::Value,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub outputs: serde_json::Value,
}

impl From<ToolResponse> for Tool {
    fn from(tool: ToolResponse) -> Self {
        Tool {
            id: tool.id,
            identifier: tool.identifier,
            name: tool.name,
            description: tool.description,
            mcp_id: tool.mcp_id,
            vertical_ids: tool.vertical_ids,
            parameters: tool.parameters,
            outputs: tool.outputs,
        }
    }
}

/// `POST /mcp/v1/tools/{name}/execute` request body.
#[derive(Debug, Serialize)]
pub struct ExecuteToolRequest<'a> {
    pub arguments: &'a Arguments,
}

/// `POST /mcp/v1/tools/{name}/execute` response.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExecuteToolResponse {
    #[serde(default)]
    pub result: Option<Arguments>,
}

// Translation between domain tools and MCP wire types

use crate::protocol::{CallToolResult, ToolSchema};
use kirha_core::{Tool, ToolExecutionResult};
use serde::de::DeserializeOwned;

/// Text of the content block returned when a tool result cannot be read.
pub const RESULT_PARSE_ERROR: &str = "Error parsing tool result";

/// Best-effort structural coercion of an arbitrary JSON document into `T`.
///
/// Returns `None` when the document does not have the shape of `T`; callers
/// pick their own fallback.
pub fn coerce<T: DeserializeOwned>(value: &serde_json::Value) -> Option<T> {
    match T::deserialize(value) {
        Ok(typed) => Some(typed),
        Err(e) => {
            tracing::debug!(error = %e, target_type = std::any::type_name::<T>(), "coercion failed");
            None
        }
    }
}

/// Wire descriptor for a tool. A parameter schema that is not shaped like an
/// input schema degrades to an empty one.
pub fn to_wire_tool(tool: &Tool) -> ToolSchema {
    ToolSchema {
        name: tool.public_name().to_string(),
        description: tool.description.clone(),
        input_schema: coerce(&tool.parameters).unwrap_or_default(),
    }
}

pub fn to_wire_tools(tools: &[Tool]) -> Vec<ToolSchema> {
    tools.iter().map(to_wire_tool).collect()
}

/// Domain view of a wire descriptor, as seen from the client side.
pub fn from_wire_tool(schema: &ToolSchema) -> Tool {
    Tool {
        id: String::new(),
        identifier: schema.name.clone(),
        name: schema.name.clone(),
        description: schema.description.clone(),
        mcp_id: String::new(),
        vertical_ids: Vec::new(),
        parameters: serde_json::to_value(&schema.input_schema).unwrap_or_default(),
        outputs: serde_json::Value::Null,
    }
}

/// Wire result for a successful execution.
///
/// Missing fields take their defaults and unknown keys are ignored. Never
/// fails: a payload whose fields have the wrong type becomes a single error
/// text block with the error flag set.
pub fn to_wire_result(result: ToolExecutionResult) -> CallToolResult {
    let payload = serde_json::Value::Object(result.result.unwrap_or_default());

    coerce(&payload).unwrap_or_else(|| {
        tracing::warn!(tool_name = %result.tool_name, "tool result does not match the content block shape");
        CallToolResult::error(RESULT_PARSE_ERROR)
    })
}

//! MCP tool implementations.
//!
//! Each worker event the host can deliver is one tool. Results are
//! pretty-printed JSON; any host effects the event requested are returned
//! under `effects` for the host to apply.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod notify;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use offgrid_core::Error;

/// Serialize a tool output as a text content block.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

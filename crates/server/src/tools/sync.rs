//! worker_sync tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::AppState;

/// Input parameters for worker_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSyncParams {
    /// Sync registration tag.
    pub tag: String,
}

/// Implementation of the worker_sync tool.
pub async fn sync_impl(state: &AppState, params: WorkerSyncParams) -> Result<CallToolResult, McpError> {
    let (worker, _host) = state.worker(Vec::new())?;
    let outcome = worker.handle_sync(&params.tag).await;
    json_result(&outcome)
}

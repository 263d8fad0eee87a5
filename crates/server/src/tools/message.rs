//! worker_message tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::json_result;
use crate::state::AppState;
use offgrid_client::{ControlMessage, HostEffect, PendingWork, Reply};

/// Input parameters for worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// The message as posted by the page, e.g. `{"type": "GET_VERSION"}`.
    pub message: serde_json::Value,

    /// Whether the page attached a reply channel.
    #[serde(default)]
    pub expect_reply: bool,
}

/// Output structure for worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageOutput {
    /// False when the message type was not recognized and nothing happened.
    pub accepted: bool,
    pub reply: Option<Reply>,
    pub effects: Vec<HostEffect>,
}

/// Implementation of the worker_message tool.
///
/// Messages are fire-and-forget: a failed CACHE_URLS is logged, not
/// returned as an error.
pub async fn message_impl(state: &AppState, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let Some(message) = ControlMessage::from_value(params.message) else {
        return json_result(&WorkerMessageOutput { accepted: false, reply: None, effects: Vec::new() });
    };

    let (worker, host) = state.worker(Vec::new())?;
    let (port, mut inbox) = if params.expect_reply {
        let (tx, rx) = oneshot::channel();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };

    let pending = PendingWork::new();
    worker.handle_message(message, port, &pending);
    let reply = inbox.as_mut().and_then(|rx| rx.try_recv().ok());
    pending.settle().await;

    json_result(&WorkerMessageOutput { accepted: true, reply, effects: host.take_effects() })
}

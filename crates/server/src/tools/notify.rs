//! worker_push and worker_notification_click tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::AppState;
use offgrid_client::{ClientWindow, HostEffect, NotificationClick, NotificationIntent, PendingWork};

/// Input parameters for worker_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerPushParams {
    /// Raw push data, normally a JSON object with title, body, primaryKey and url.
    #[serde(default)]
    pub data: Option<String>,
}

/// Output structure for worker_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerPushOutput {
    pub notification: Option<NotificationIntent>,
    pub effects: Vec<HostEffect>,
}

/// Input parameters for worker_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerClickParams {
    #[serde(flatten)]
    pub click: NotificationClick,

    /// Window clients currently open on the host.
    #[serde(default)]
    pub clients: Vec<ClientWindow>,
}

/// Output structure for worker_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerClickOutput {
    pub effects: Vec<HostEffect>,
}

/// Implementation of the worker_push tool.
pub async fn push_impl(state: &AppState, params: WorkerPushParams) -> Result<CallToolResult, McpError> {
    let (worker, host) = state.worker(Vec::new())?;
    let pending = PendingWork::new();
    let notification = worker.handle_push(params.data.as_deref().map(str::as_bytes), &pending);
    pending.settle().await;

    json_result(&WorkerPushOutput { notification, effects: host.take_effects() })
}

/// Implementation of the worker_notification_click tool.
pub async fn click_impl(state: &AppState, params: WorkerClickParams) -> Result<CallToolResult, McpError> {
    let (worker, host) = state.worker(params.clients)?;
    let pending = PendingWork::new();
    worker.handle_notification_click(params.click, &pending).await;
    pending.settle().await;

    json_result(&WorkerClickOutput { effects: host.take_effects() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{FixedNetwork, output_json, state_with};

    #[tokio::test]
    async fn test_push_then_click() {
        let state = state_with(FixedNetwork::default()).await;
        let data = r#"{"title":"Hello","url":"/post/7","primaryKey":"7"}"#.to_string();

        let output = output_json(&push_impl(&state, WorkerPushParams { data: Some(data) }).await.unwrap());
        assert_eq!(output["notification"]["title"], "Hello");
        assert_eq!(output["effects"][0]["effect"], "show_notification");

        let notification: NotificationIntent = serde_json::from_value(output["notification"].clone()).unwrap();
        let params = WorkerClickParams {
            click: NotificationClick { action: Some("open".into()), notification },
            clients: vec![ClientWindow { id: "tab-1".into(), url: "https://blog.example.com/post/7".into() }],
        };
        let output = output_json(&click_impl(&state, params).await.unwrap());
        assert_eq!(
            output["effects"],
            serde_json::json!([
                {"effect": "close_notification", "tag": "7"},
                {"effect": "focus_client", "id": "tab-1"}
            ])
        );
    }

    #[tokio::test]
    async fn test_push_without_data() {
        let state = state_with(FixedNetwork::default()).await;
        let output = output_json(&push_impl(&state, WorkerPushParams { data: None }).await.unwrap());
        assert!(output["notification"].is_null());
        assert_eq!(output["effects"], serde_json::json!([]));
    }
}

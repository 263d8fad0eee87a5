//! worker_install and worker_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::AppState;
use offgrid_client::{ActivateReport, HostEffect};

/// Parameters for lifecycle tools. They take none.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LifecycleParams {}

/// Output from the worker_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    /// Static partition the assets went into.
    pub partition: String,
    /// Number of assets stored.
    pub stored: usize,
    pub effects: Vec<HostEffect>,
}

/// Output from the worker_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    #[serde(flatten)]
    pub report: ActivateReport,
    pub effects: Vec<HostEffect>,
}

/// Implementation of the worker_install tool.
///
/// Fails as a whole when any static asset cannot be fetched; the host
/// should retry the install later.
pub async fn install_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let (worker, host) = state.worker(Vec::new())?;
    let stored = worker.install().await?;

    json_result(&InstallOutput {
        partition: worker.partitions().static_name().to_string(),
        stored,
        effects: host.take_effects(),
    })
}

/// Implementation of the worker_activate tool.
pub async fn activate_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let (worker, host) = state.worker(Vec::new())?;
    let report = worker.activate().await?;

    json_result(&ActivateOutput { report, effects: host.take_effects() })
}

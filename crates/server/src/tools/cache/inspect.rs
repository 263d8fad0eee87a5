//! cache_inspect tool implementation.
//!
//! Lists partitions with their entry counts, flagging stale ones.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::tools::json_result;
use offgrid_core::{Error, RequestKey};

/// Parameters for the cache_inspect tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheInspectParams {
    /// List the stored request identities of this partition.
    pub partition: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PartitionSummary {
    pub name: String,
    pub entries: usize,
    /// Not owned by the running version; removed on the next activation.
    pub stale: bool,
}

/// Output from the cache_inspect tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInspectOutput {
    pub version: String,
    pub partitions: Vec<PartitionSummary>,
    pub keys: Option<Vec<RequestKey>>,
}

/// Implementation of the cache_inspect tool.
pub async fn inspect_impl(state: &AppState, params: CacheInspectParams) -> Result<CallToolResult, McpError> {
    let names = state.config.partitions();

    let mut partitions = Vec::new();
    for name in state.store.partitions().await? {
        let entries = state.store.entry_keys(&name).await?.len();
        partitions.push(PartitionSummary { stale: names.is_stale(&name), name, entries });
    }

    let keys = match params.partition {
        Some(partition) => {
            if !state.store.has(&partition).await? {
                return Err(Error::InvalidInput(format!("no partition named {partition}")).into());
            }
            Some(state.store.entry_keys(&partition).await?)
        }
        None => None,
    };

    json_result(&CacheInspectOutput { version: state.config.version.clone(), partitions, keys })
}

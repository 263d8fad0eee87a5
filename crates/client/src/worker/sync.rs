//! Background sync hook.

use serde::{Deserialize, Serialize};

use super::Worker;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The tag is ours; queued writes were replayed.
    Replayed { count: usize },
    /// Some other component's tag.
    Ignored,
}

impl Worker {
    /// Called by the host when connectivity returns. The host keeps the
    /// sync event open until this resolves.
    pub async fn handle_sync(&self, tag: &str) -> SyncOutcome {
        if tag != self.config.sync_tag {
            tracing::debug!(tag = %tag, "sync tag ignored");
            return SyncOutcome::Ignored;
        }

        tracing::info!(tag = %tag, "background sync");
        let count = self.replay_queued_writes().await;
        SyncOutcome::Replayed { count }
    }

    async fn replay_queued_writes(&self) -> usize {
        // TODO: queue non-GET requests that fail while offline and replay them here.
        0
    }
}

//! Control messages sent by pages to the worker.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::{PendingWork, Worker};
use offgrid_core::Error;
use offgrid_core::url::canonicalize;

/// Inbound control messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Become active now instead of waiting for every page to close.
    SkipWaiting,
    /// Best-effort bulk insert into the dynamic partition.
    CacheUrls { payload: Vec<String> },
    /// Ask for the running version token.
    GetVersion,
}

impl ControlMessage {
    /// Decode a message. Unknown or malformed messages yield `None`.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unrecognized control message");
                None
            }
        }
    }
}

/// Replies sent back over a message's reply channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reply {
    Version { version: String },
}

/// Reply channel attached to a message.
pub type ReplyPort = oneshot::Sender<Reply>;

impl Worker {
    /// Dispatch a control message.
    ///
    /// Replies are sent before this returns. Anything asynchronous is
    /// registered on `pending`.
    pub fn handle_message(&self, message: ControlMessage, reply: Option<ReplyPort>, pending: &PendingWork) {
        match message {
            ControlMessage::SkipWaiting => {
                tracing::info!("skip waiting requested");
                let host = self.host.clone();
                pending.wait_until(async move { host.skip_waiting().await });
            }
            ControlMessage::CacheUrls { payload } => {
                let worker = self.clone();
                pending.wait_until(async move {
                    match worker.cache_urls(&payload).await {
                        Ok(count) => tracing::info!(count, "cached requested URLs"),
                        Err(e) => {
                            tracing::warn!(requested = payload.len(), error = %e, "failed to cache requested URLs")
                        }
                    }
                });
            }
            ControlMessage::GetVersion => match reply {
                Some(port) => {
                    if port.send(Reply::Version { version: self.version().to_string() }).is_err() {
                        tracing::debug!("version requester went away");
                    }
                }
                None => tracing::debug!("GET_VERSION without a reply channel"),
            },
        }
    }

    /// Fetch `urls` and store them all in the dynamic partition, or none of them.
    async fn cache_urls(&self, urls: &[String]) -> Result<usize, Error> {
        let resolved = urls
            .iter()
            .map(|u| canonicalize(u, Some(self.origin())).map_err(|e| Error::InvalidUrl(format!("{u}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        let entries = self.fetch_all(&resolved).await?;
        self.store.put_all(self.partitions.dynamic_name(), &entries).await?;
        Ok(entries.len())
    }
}

//! Install and activate: partition lifecycle.

use serde::{Deserialize, Serialize};

use super::Worker;
use offgrid_core::Error;

/// What activation did to the partition set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    /// Stale partitions that were deleted.
    pub deleted: Vec<String>,
    /// Partitions present afterwards, in registration order.
    pub partitions: Vec<String>,
}

impl Worker {
    /// Pre-populate the static partition with the configured shell assets.
    ///
    /// All-or-nothing: every asset is fetched before anything is written, and
    /// the write is a single transaction. Any failure aborts the install and
    /// must be retried as a whole. The worker does not skip waiting on success.
    ///
    /// Returns the number of assets stored.
    pub async fn install(&self) -> Result<usize, Error> {
        let partition = self.partitions.static_name().to_string();
        tracing::info!(partition = %partition, version = %self.version(), "installing");

        let urls = self
            .config
            .static_asset_urls()
            .map_err(|e| Error::InstallFailed(e.to_string()))?;

        self.store.open(&partition).await?;

        let entries = self.fetch_all(&urls).await.map_err(|e| {
            tracing::error!(partition = %partition, error = %e, "failed to fetch static assets");
            Error::InstallFailed(e.to_string())
        })?;

        self.store.put_all(&partition, &entries).await.map_err(|e| {
            tracing::error!(partition = %partition, error = %e, "failed to store static assets");
            Error::InstallFailed(e.to_string())
        })?;

        tracing::info!(partition = %partition, assets = entries.len(), "static assets cached");
        Ok(entries.len())
    }

    /// Delete every partition that does not belong to the running version,
    /// then take control of open pages.
    ///
    /// Both current partitions exist afterwards. Running it again without a
    /// version change is a no-op apart from re-claiming clients.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        tracing::info!(version = %self.version(), "activating");

        let mut deleted = Vec::new();
        for name in self.store.partitions().await? {
            if self.partitions.is_stale(&name) {
                tracing::info!(partition = %name, "deleting stale partition");
                if self.store.delete(&name).await? {
                    deleted.push(name);
                }
            }
        }

        self.store.open(self.partitions.static_name()).await?;
        self.store.open(self.partitions.dynamic_name()).await?;

        self.host.claim_clients().await;

        let partitions = self.store.partitions().await?;
        tracing::info!(deleted = deleted.len(), "activated");
        Ok(ActivateReport { deleted, partitions })
    }
}

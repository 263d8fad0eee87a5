//! The request-interception engine.
//!
//! A [`Worker`] is rebuilt for every event the host delivers; it carries no
//! state of its own beyond configuration. Everything durable lives in the
//! [`CacheStore`].
//!
//! Event entry points:
//! - [`Worker::install`] / [`Worker::activate`]: partition lifecycle
//! - [`Worker::handle_fetch`]: strategy execution for one intercepted request
//! - [`Worker::handle_message`]: control messages from pages
//! - [`Worker::handle_push`] / [`Worker::handle_notification_click`]
//! - [`Worker::handle_sync`]: deferred retry when connectivity returns

pub mod host;
pub mod intercept;
pub mod lifecycle;
pub mod messages;
pub mod notify;
pub mod pending;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use futures_util::future::try_join_all;
use url::Url;

use crate::fetch::Fetcher;
use crate::policy::Policy;
use offgrid_core::{AppConfig, CacheStore, Error, PartitionNames, Request, RequestKey, Response};

pub use host::{ClientWindow, Host, HostEffect, RecordingHost};
pub use intercept::{FetchOutcome, ResponseSource};
pub use lifecycle::ActivateReport;
pub use messages::{ControlMessage, Reply, ReplyPort};
pub use notify::{NotificationAction, NotificationClick, NotificationIntent, PushPayload};
pub use pending::PendingWork;
pub use sync::SyncOutcome;

/// The engine, bound to one store, one network and one host.
#[derive(Clone)]
pub struct Worker {
    config: Arc<AppConfig>,
    partitions: PartitionNames,
    policy: Arc<Policy>,
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Fetcher>,
    host: Arc<dyn Host>,
}

impl Worker {
    pub fn new(
        config: Arc<AppConfig>, store: Arc<dyn CacheStore>, network: Arc<dyn Fetcher>, host: Arc<dyn Host>,
    ) -> Result<Self, Error> {
        let policy = Policy::from_config(&config).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let partitions = config.partitions();
        Ok(Self { config, partitions, policy: Arc::new(policy), store, network, host })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn partitions(&self) -> &PartitionNames {
        &self.partitions
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The running version token.
    pub fn version(&self) -> &str {
        &self.config.version
    }

    fn origin(&self) -> &Url {
        self.policy.origin()
    }

    /// Fetch every URL and require a success status for each.
    ///
    /// Fails on the first network error or non-success response, so callers
    /// can commit the batch all-or-nothing.
    async fn fetch_all(&self, urls: &[Url]) -> Result<Vec<(RequestKey, Response)>, Error> {
        let fetches = urls.iter().map(|url| async move {
            let request = Request::get(url.clone());
            let response = self.network.fetch(&request).await?;
            if !response.is_success() {
                return Err(Error::HttpError(format!("{} returned status {}", url, response.status)));
            }
            Ok((request.key(), response))
        });
        try_join_all(fetches).await
    }
}

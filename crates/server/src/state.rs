//! Shared state for tool calls.

use std::sync::Arc;

use offgrid_client::{ClientWindow, FetchClient, FetchConfig, Fetcher, RecordingHost, Worker};
use offgrid_core::{AppConfig, CacheDb, CacheStore, Error};

/// Long-lived resources. A fresh [`Worker`] is built per event, so nothing
/// about one event leaks into the next.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn CacheStore>,
    pub network: Arc<dyn Fetcher>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Fetcher>) -> Self {
        Self { config: Arc::new(config), store, network }
    }

    /// Open the configured database and build the HTTP client.
    pub async fn open(config: AppConfig) -> Result<Self, Error> {
        let store = CacheDb::open(&config.db_path).await?.with_max_entries(config.max_entries);
        let network = FetchClient::new(FetchConfig::from_app(&config)?)?;
        tracing::info!(db_path = %config.db_path.display(), version = %config.version, "cache opened");
        Ok(Self::new(config, Arc::new(store), Arc::new(network)))
    }

    /// A worker for one event, with a host that records the effects it requests.
    pub fn worker(&self, clients: Vec<ClientWindow>) -> Result<(Worker, Arc<RecordingHost>), Error> {
        let host = Arc::new(RecordingHost::new(clients));
        let worker = Worker::new(self.config.clone(), self.store.clone(), self.network.clone(), host.clone())?;
        Ok((worker, host))
    }
}

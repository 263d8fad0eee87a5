//! Test doubles for the engine: a scripted network, instrumented stores and
//! a ready-made harness.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use super::{ClientWindow, RecordingHost, Worker};
use crate::fetch::Fetcher;
use offgrid_core::{
    AppConfig, CacheDb, CacheStore, Error, Request, RequestKey, Response, ResponseType, StoredResponse,
};

pub fn html(body: &'static str) -> Response {
    Response::new(200, ResponseType::Basic, body).with_header("content-type", "text/html")
}

pub fn png(body: &'static [u8]) -> Response {
    Response::new(200, ResponseType::Basic, body).with_header("content-type", "image/png")
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// Network that answers from a script. Unscripted URLs fail like an offline network.
#[derive(Default)]
pub struct ScriptedNetwork {
    script: Mutex<HashMap<String, Option<Response>>>,
    calls: AtomicUsize,
}

impl ScriptedNetwork {
    pub fn respond(&self, url: &str, response: Response) {
        self.script.lock().unwrap().insert(url.to_string(), Some(response));
    }

    pub fn fail(&self, url: &str) {
        self.script.lock().unwrap().insert(url.to_string(), None);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().unwrap().get(request.url.as_str()).cloned().flatten();
        scripted
            .map(|r| r.with_url(request.url.clone()))
            .ok_or_else(|| Error::FetchFailed(format!("offline: {}", request.url)))
    }
}

/// Store wrapper that counts every call, to prove a path never touches the cache.
pub struct CountingStore {
    inner: CacheDb,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: CacheDb) -> Self {
        Self { inner, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for CountingStore {
    async fn open(&self, partition: &str) -> Result<(), Error> {
        self.tick();
        self.inner.open(partition).await
    }

    async fn has(&self, partition: &str) -> Result<bool, Error> {
        self.tick();
        self.inner.has(partition).await
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        self.tick();
        self.inner.partitions().await
    }

    async fn delete(&self, partition: &str) -> Result<bool, Error> {
        self.tick();
        self.inner.delete(partition).await
    }

    async fn match_in(&self, partition: &str, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        self.tick();
        self.inner.match_in(partition, key).await
    }

    async fn put(&self, partition: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.tick();
        self.inner.put(partition, key, response).await
    }

    async fn put_all(&self, partition: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        self.tick();
        self.inner.put_all(partition, entries).await
    }

    async fn entry_keys(&self, partition: &str) -> Result<Vec<RequestKey>, Error> {
        self.tick();
        self.inner.entry_keys(partition).await
    }
}

pub fn test_config() -> AppConfig {
    AppConfig { origin: "https://blog.example.com".into(), ..Default::default() }
}

/// A worker wired to an in-memory store, a scripted network and a recording host.
pub struct Harness {
    pub config: Arc<AppConfig>,
    pub store: Arc<CacheDb>,
    pub network: Arc<ScriptedNetwork>,
    pub host: Arc<RecordingHost>,
    pub worker: Worker,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        Self::build(config, Vec::new()).await
    }

    pub async fn with_clients(clients: Vec<ClientWindow>) -> Self {
        Self::build(test_config(), clients).await
    }

    async fn build(config: AppConfig, clients: Vec<ClientWindow>) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap().with_max_entries(config.max_entries));
        let network = Arc::new(ScriptedNetwork::default());
        let host = Arc::new(RecordingHost::new(clients));
        let worker = Worker::new(config.clone(), store.clone(), network.clone(), host.clone()).unwrap();
        Self { config, store, network, host, worker }
    }
}

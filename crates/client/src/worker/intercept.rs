//! Strategy execution for intercepted requests.

use serde::{Deserialize, Serialize};

use super::{PendingWork, Worker};
use crate::fallback;
use crate::policy::Strategy;
use offgrid_core::{Error, Request, RequestKey, Response, StoredResponse};

/// Where a response handed back to the page came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ResponseSource {
    Cache { partition: String },
    Network,
    Fallback,
}

/// Result of intercepting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted: the host performs its default network handling.
    Passthrough,
    Respond { response: Response, source: ResponseSource },
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Respond { response, .. } => Some(response),
        }
    }

    pub fn source(&self) -> Option<&ResponseSource> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Respond { source, .. } => Some(source),
        }
    }
}

impl Worker {
    /// Handle one intercepted request.
    ///
    /// Cache writes started here are registered on `pending`; the caller
    /// must settle it before the worker may be released.
    ///
    /// # Errors
    ///
    /// Network failures on the network-only path, and on the cache-first
    /// path for destinations without fallback content.
    pub async fn handle_fetch(&self, request: Request, pending: &PendingWork) -> Result<FetchOutcome, Error> {
        let strategy = self.policy.classify(&request);
        tracing::debug!(method = %request.method, url = %request.url, ?strategy, "classified");

        match strategy {
            Strategy::Bypass => Ok(FetchOutcome::Passthrough),
            Strategy::NetworkOnly => {
                let response = self.network.fetch(&request).await?;
                Ok(FetchOutcome::Respond { response, source: ResponseSource::Network })
            }
            Strategy::CacheFirst => self.cache_first(request, pending).await,
        }
    }

    async fn cache_first(&self, request: Request, pending: &PendingWork) -> Result<FetchOutcome, Error> {
        let key = request.key();

        if let Some((partition, stored)) = self.lookup(&key).await {
            tracing::debug!(key = %key, partition = %partition, "cache hit");
            return Ok(FetchOutcome::Respond { response: stored.response, source: ResponseSource::Cache { partition } });
        }

        let response = match self.network.fetch(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(key = %key, destination = %request.destination, error = %err, "fetch failed");
                return match fallback::for_destination(request.destination) {
                    Some(response) => Ok(FetchOutcome::Respond { response, source: ResponseSource::Fallback }),
                    None => Err(err),
                };
            }
        };

        if !self.policy.is_cacheable_response(&response) {
            tracing::debug!(
                key = %key,
                status = response.status,
                response_type = response.response_type.as_str(),
                "response not cacheable"
            );
        } else if !self.policy.is_write_eligible(&request) {
            tracing::debug!(key = %key, destination = %request.destination, "response not write-eligible");
        } else if response.body.len() > self.config.max_bytes {
            tracing::warn!(
                key = %key,
                bytes = response.body.len(),
                max_bytes = self.config.max_bytes,
                "response too large to cache"
            );
        } else {
            self.store_in_background(key, response.clone(), pending);
        }

        Ok(FetchOutcome::Respond { response, source: ResponseSource::Network })
    }

    /// Dynamic overrides static. Read errors count as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<(String, StoredResponse)> {
        for partition in self.partitions.lookup_order() {
            match self.store.match_in(partition, key).await {
                Ok(Some(stored)) => return Some((partition.to_string(), stored)),
                Ok(None) => {}
                Err(e) => tracing::warn!(key = %key, partition = %partition, error = %e, "cache read failed"),
            }
        }
        None
    }

    /// Persist an independent copy into the dynamic partition.
    ///
    /// Write failures are logged and dropped; the caller already has its response.
    fn store_in_background(&self, key: RequestKey, copy: Response, pending: &PendingWork) {
        let store = self.store.clone();
        let partition = self.partitions.dynamic_name().to_string();
        pending.wait_until(async move {
            match store.put(&partition, &key, &copy).await {
                Ok(()) => tracing::debug!(key = %key, partition = %partition, "stored response"),
                Err(e) => tracing::warn!(key = %key, partition = %partition, error = %e, "cache write failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::testing::{CountingStore, Harness, ScriptedNetwork, html, png, test_config, url};
    use super::super::{RecordingHost, Worker};
    use super::*;
    use crate::fallback::{OFFLINE_HTML, PLACEHOLDER_SVG};
    use offgrid_core::{AppConfig, CacheDb, CacheStore, Destination, ResponseType};

    fn get(u: &str, destination: Destination) -> Request {
        Request::new("GET", url(u), destination)
    }

    async fn run(h: &Harness, request: Request) -> Result<FetchOutcome, Error> {
        let pending = PendingWork::new();
        let outcome = h.worker.handle_fetch(request, &pending).await;
        pending.settle().await;
        outcome
    }

    async fn all_keys(h: &Harness) -> Vec<RequestKey> {
        let mut keys = Vec::new();
        for partition in h.store.partitions().await.unwrap() {
            keys.extend(h.store.entry_keys(&partition).await.unwrap());
        }
        keys
    }

    #[tokio::test]
    async fn test_non_get_never_touches_cache() {
        let store = Arc::new(CountingStore::new(CacheDb::open_in_memory().await.unwrap()));
        let network = Arc::new(ScriptedNetwork::default());
        let worker = Worker::new(
            Arc::new(test_config()),
            store.clone(),
            network.clone(),
            Arc::new(RecordingHost::default()),
        )
        .unwrap();

        for method in ["POST", "PUT", "DELETE"] {
            let pending = PendingWork::new();
            let request = Request::new(method, url("https://blog.example.com/comments"), Destination::Other);
            let outcome = worker.handle_fetch(request, &pending).await.unwrap();
            assert_eq!(outcome, FetchOutcome::Passthrough);
            assert_eq!(pending.settle().await, 0);
        }

        assert_eq!(store.calls(), 0);
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn test_extension_scheme_passthrough() {
        let h = Harness::new().await;
        let outcome = run(&h, get("chrome-extension://abc/inject.js", Destination::Other)).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Passthrough);
        assert_eq!(h.network.calls(), 0);
    }

    #[tokio::test]
    async fn test_network_only_returns_verbatim_and_never_caches() {
        let h = Harness::new().await;
        let u = "https://blog.example.com/feeds/posts/default";
        h.network.respond(u, html("<feed/>"));

        let outcome = run(&h, get(u, Destination::Document)).await.unwrap();
        let response = outcome.response().unwrap();
        assert_eq!(response.body, "<feed/>".as_bytes());
        assert_eq!(outcome.source(), Some(&ResponseSource::Network));

        assert!(all_keys(&h).await.is_empty());
        run(&h, get(u, Destination::Document)).await.unwrap();
        assert_eq!(h.network.calls(), 2);
    }

    #[tokio::test]
    async fn test_network_only_failure_propagates() {
        let h = Harness::new().await;
        let err = run(&h, get("https://blog.example.com/search/foo", Destination::Document)).await.unwrap_err();
        assert!(matches!(err, Error::FetchFailed(_)));
    }

    #[tokio::test]
    async fn test_cached_snapshot_served_without_network() {
        let h = Harness::new().await;
        let u = "https://blog.example.com/2024/05/post.html";
        h.store
            .put(h.worker.partitions().dynamic_name(), &get(u, Destination::Document).key(), &html("<p>saved</p>"))
            .await
            .unwrap();

        let outcome = run(&h, get(u, Destination::Document)).await.unwrap();
        assert_eq!(outcome.response().unwrap().body, "<p>saved</p>".as_bytes());
        assert_eq!(h.network.calls(), 0);
    }

    #[tokio::test]
    async fn test_written_response_round_trips() {
        let h = Harness::new().await;
        let u = "https://blog.example.com/about";
        h.network.respond(u, html("<h1>About</h1>"));

        let first = run(&h, get(u, Destination::Document)).await.unwrap();
        assert_eq!(first.source(), Some(&ResponseSource::Network));
        assert_eq!(h.network.calls(), 1);

        let second = run(&h, get(u, Destination::Document)).await.unwrap();
        assert_eq!(h.network.calls(), 1);
        assert_eq!(
            second.source(),
            Some(&ResponseSource::Cache { partition: h.worker.partitions().dynamic_name().to_string() })
        );
        let (a, b) = (first.response().unwrap(), second.response().unwrap());
        assert_eq!(a.body, b.body);
        assert_eq!(a.status, b.status);
        assert_eq!(a.headers, b.headers);
    }

    #[tokio::test]
    async fn test_dynamic_overrides_static() {
        let h = Harness::new().await;
        let request = get("https://blog.example.com/", Destination::Document);
        let partitions = h.worker.partitions().clone();
        h.store.put(partitions.static_name(), &request.key(), &html("static")).await.unwrap();
        h.store.put(partitions.dynamic_name(), &request.key(), &html("dynamic")).await.unwrap();

        let outcome = run(&h, request).await.unwrap();
        assert_eq!(outcome.response().unwrap().body, "dynamic".as_bytes());
    }

    #[tokio::test]
    async fn test_static_partition_hit() {
        let h = Harness::new().await;
        let request = get("https://blog.example.com/favicon.ico", Destination::Image);
        h.store.put(h.worker.partitions().static_name(), &request.key(), &png(b"\x89PNG")).await.unwrap();

        let outcome = run(&h, request).await.unwrap();
        assert!(matches!(outcome.source(), Some(ResponseSource::Cache { partition }) if partition.contains("static")));
        assert_eq!(h.network.calls(), 0);
    }

    #[tokio::test]
    async fn test_offline_document_fallback() {
        let h = Harness::new().await;
        let outcome = run(&h, get("https://blog.example.com/never-seen", Destination::Document)).await.unwrap();

        assert_eq!(outcome.source(), Some(&ResponseSource::Fallback));
        let response = outcome.response().unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, OFFLINE_HTML.as_bytes());
        assert_eq!(response.headers.get("cache-control"), Some("no-cache"));
        assert_eq!(response.content_type(), Some("text/html"));
        assert!(all_keys(&h).await.is_empty());
    }

    #[tokio::test]
    async fn test_placeholder_image_fallback() {
        let h = Harness::new().await;
        let outcome = run(&h, get("https://img.example.net/cat.jpg", Destination::Image)).await.unwrap();

        let response = outcome.response().unwrap();
        assert_eq!(response.body, PLACEHOLDER_SVG.as_bytes());
        assert_eq!(response.content_type(), Some("image/svg+xml"));
        assert_eq!(response.headers.get("cache-control"), Some("no-cache"));
        assert!(all_keys(&h).await.is_empty());
    }

    #[tokio::test]
    async fn test_other_destination_failure_propagates() {
        let h = Harness::new().await;
        let err = run(&h, get("https://blog.example.com/app.js", Destination::Other)).await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_image_404_returned_as_is() {
        let h = Harness::new().await;
        let u = "https://blog.example.com/img/missing.png";
        h.network.respond(u, png(b"not found").with_status(404));

        let outcome = run(&h, get(u, Destination::Image)).await.unwrap();
        let response = outcome.response().unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body, "not found".as_bytes());
        assert_eq!(outcome.source(), Some(&ResponseSource::Network));
        assert!(all_keys(&h).await.is_empty());
    }

    #[tokio::test]
    async fn test_opaque_response_not_cached() {
        let h = Harness::new().await;
        let u = "https://cdn.example.net/hero.jpg";
        h.network.respond(u, Response::new(200, ResponseType::Opaque, ""));

        let outcome = run(&h, get(u, Destination::Image)).await.unwrap();
        assert_eq!(outcome.response().unwrap().response_type, ResponseType::Opaque);
        assert!(all_keys(&h).await.is_empty());
    }

    #[tokio::test]
    async fn test_cross_origin_other_not_written() {
        let h = Harness::new().await;
        let u = "https://cdn.example.net/lib.js";
        h.network.respond(u, html("js"));

        let outcome = run(&h, get(u, Destination::Other)).await.unwrap();
        assert_eq!(outcome.response().unwrap().body, "js".as_bytes());
        assert!(all_keys(&h).await.is_empty());
    }

    #[tokio::test]
    async fn test_cross_origin_image_written() {
        let h = Harness::new().await;
        let u = "https://cdn.example.net/photo.png";
        h.network.respond(u, png(b"\x89PNG"));

        run(&h, get(u, Destination::Image)).await.unwrap();
        let keys = h.store.entry_keys(h.worker.partitions().dynamic_name()).await.unwrap();
        assert_eq!(keys, vec![get(u, Destination::Image).key()]);
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_swallowed() {
        let config = AppConfig { max_entries: Some(1), ..test_config() };
        let h = Harness::with_config(config).await;
        let dynamic = h.worker.partitions().dynamic_name().to_string();
        let existing = get("https://blog.example.com/a", Destination::Document).key();
        h.store.put(&dynamic, &existing, &html("a")).await.unwrap();

        let u = "https://blog.example.com/b";
        h.network.respond(u, html("b"));
        let outcome = run(&h, get(u, Destination::Document)).await.unwrap();

        assert_eq!(outcome.response().unwrap().body, "b".as_bytes());
        assert_eq!(h.store.entry_keys(&dynamic).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_response_returned_but_not_cached() {
        let config = AppConfig { max_bytes: 16, ..test_config() };
        let h = Harness::with_config(config).await;
        let u = "https://blog.example.com/img/banner.png";
        h.network.respond(u, png(b"\x89PNG\r\n\x1a\n-thirty-two-bytes-of-image"));

        let outcome = run(&h, get(u, Destination::Image)).await.unwrap();
        assert_eq!(outcome.source(), Some(&ResponseSource::Network));
        assert_eq!(outcome.response().unwrap().body, b"\x89PNG\r\n\x1a\n-thirty-two-bytes-of-image".as_slice());
        assert!(all_keys(&h).await.is_empty());

        run(&h, get(u, Destination::Image)).await.unwrap();
        assert_eq!(h.network.calls(), 2);
    }

    #[tokio::test]
    async fn test_fragment_ignored_for_lookup() {
        let h = Harness::new().await;
        h.network.respond("https://blog.example.com/post", html("post"));

        run(&h, get("https://blog.example.com/post", Destination::Document)).await.unwrap();
        let outcome = run(&h, get("https://blog.example.com/post#comments", Destination::Document)).await.unwrap();
        assert!(matches!(outcome.source(), Some(ResponseSource::Cache { .. })));
    }
}

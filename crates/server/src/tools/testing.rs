//! Shared fixtures for tool tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::CallToolResult;

use crate::state::AppState;
use offgrid_client::Fetcher;
use offgrid_core::{AppConfig, CacheDb, Error, Request, Response, ResponseType};

/// Network with a fixed set of reachable URLs; everything else is offline.
#[derive(Default)]
pub struct FixedNetwork {
    pages: HashMap<String, (u16, &'static [u8])>,
}

impl FixedNetwork {
    pub fn with(self, url: &str, status: u16, body: &'static str) -> Self {
        self.with_bytes(url, status, body.as_bytes())
    }

    pub fn with_bytes(mut self, url: &str, status: u16, body: &'static [u8]) -> Self {
        self.pages.insert(url.to_string(), (status, body));
        self
    }
}

#[async_trait]
impl Fetcher for FixedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        match self.pages.get(request.url.as_str()) {
            Some((status, body)) => Ok(Response::new(*status, ResponseType::Basic, *body)
                .with_header("content-type", "text/html")
                .with_url(request.url.clone())),
            None => Err(Error::FetchFailed(format!("offline: {}", request.url))),
        }
    }
}

pub async fn state_with(network: FixedNetwork) -> AppState {
    let config = AppConfig {
        origin: "https://blog.example.com".into(),
        static_assets: vec!["/".into(), "/favicon.ico".into()],
        ..Default::default()
    };
    let store = CacheDb::open_in_memory().await.unwrap();
    AppState::new(config, Arc::new(store), Arc::new(network))
}

/// Parse the JSON text of the first content block.
pub fn output_json(result: &CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}

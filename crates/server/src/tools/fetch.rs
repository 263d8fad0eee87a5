//! worker_fetch tool implementation.
//!
//! Delivers one intercepted request to the worker and returns what the page
//! should receive.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::AppState;
use offgrid_client::{FetchOutcome, PendingWork, ResponseSource};
use offgrid_core::url::canonicalize;
use offgrid_core::{Destination, Error, Headers, Request, ResponseType};

/// Input parameters for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute request URL.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination: "document", "image", or anything else.
    #[serde(default)]
    pub destination: Destination,
}

fn default_method() -> String {
    "GET".into()
}

/// How `body` is encoded in the tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// The body is valid UTF-8 and is sent as is.
    Utf8,
    /// Binary body, standard base64.
    Base64,
}

/// Encode a body without losing bytes.
fn encode_body(body: &[u8]) -> (String, BodyEncoding) {
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), BodyEncoding::Utf8),
        Err(_) => (STANDARD.encode(body), BodyEncoding::Base64),
    }
}

/// Output structure for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    /// True when the worker did not intercept; the host fetches normally.
    pub passthrough: bool,
    pub source: Option<ResponseSource>,
    pub status: Option<u16>,
    pub response_type: Option<ResponseType>,
    pub headers: Option<Headers>,
    pub body: Option<String>,
    pub encoding: Option<BodyEncoding>,
}

impl From<FetchOutcome> for WorkerFetchOutput {
    fn from(outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Passthrough => Self {
                passthrough: true,
                source: None,
                status: None,
                response_type: None,
                headers: None,
                body: None,
                encoding: None,
            },
            FetchOutcome::Respond { response, source } => {
                let (body, encoding) = encode_body(&response.body);
                Self {
                    passthrough: false,
                    source: Some(source),
                    status: Some(response.status),
                    response_type: Some(response.response_type),
                    headers: Some(response.headers),
                    body: Some(body),
                    encoding: Some(encoding),
                }
            }
        }
    }
}

/// Implementation of the worker_fetch tool.
///
/// Network failures the worker does not recover from are returned as tool
/// errors, exactly as a page would see a rejected fetch.
pub async fn fetch_impl(state: &AppState, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let url = canonicalize(&params.url, None).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = Request::new(params.method, url, params.destination);

    let (worker, _host) = state.worker(Vec::new())?;
    let pending = PendingWork::new();
    let outcome = worker.handle_fetch(request, &pending).await;
    pending.settle().await;

    json_result(&WorkerFetchOutput::from(outcome?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{FixedNetwork, output_json, state_with};

    fn params(url: &str, method: &str, destination: Destination) -> WorkerFetchParams {
        WorkerFetchParams { url: url.into(), method: method.into(), destination }
    }

    #[tokio::test]
    async fn test_post_is_passthrough() {
        let state = state_with(FixedNetwork::default()).await;
        let result = fetch_impl(&state, params("https://blog.example.com/c", "POST", Destination::Other)).await;
        let output = output_json(&result.unwrap());
        assert_eq!(output["passthrough"], true);
        assert!(output["body"].is_null());
    }

    #[tokio::test]
    async fn test_second_fetch_served_from_cache() {
        let network = FixedNetwork::default().with("https://blog.example.com/post", 200, "<p>post</p>");
        let state = state_with(network).await;

        let request = params("https://blog.example.com/post", "GET", Destination::Document);
        let first = output_json(&fetch_impl(&state, request.clone()).await.unwrap());
        assert_eq!(first["source"]["source"], "network");

        let second = output_json(&fetch_impl(&state, request).await.unwrap());
        assert_eq!(second["source"]["source"], "cache");
        assert_eq!(second["body"], "<p>post</p>");
        assert_eq!(second["encoding"], "utf8");
    }

    #[tokio::test]
    async fn test_binary_image_survives_cache_round_trip() {
        let png: &'static [u8] = b"\x89PNG\r\n\x1a\n\xff\xfe";
        let network = FixedNetwork::default().with_bytes("https://blog.example.com/a.png", 200, png);
        let state = state_with(network).await;

        let request = params("https://blog.example.com/a.png", "GET", Destination::Image);
        let first = output_json(&fetch_impl(&state, request.clone()).await.unwrap());
        let second = output_json(&fetch_impl(&state, request).await.unwrap());
        assert_eq!(second["source"]["source"], "cache");

        for output in [first, second] {
            assert_eq!(output["encoding"], "base64");
            let body = STANDARD.decode(output["body"].as_str().unwrap()).unwrap();
            assert_eq!(body, png);
        }
    }

    #[tokio::test]
    async fn test_offline_document() {
        let state = state_with(FixedNetwork::default()).await;
        let output = output_json(
            &fetch_impl(&state, params("https://blog.example.com/new", "GET", Destination::Document)).await.unwrap(),
        );
        assert_eq!(output["source"]["source"], "fallback");
        assert_eq!(output["status"], 200);
        assert_eq!(output["headers"]["cache-control"], "no-cache");
    }

    #[tokio::test]
    async fn test_network_only_failure_is_error() {
        let state = state_with(FixedNetwork::default()).await;
        let err = fetch_impl(&state, params("https://blog.example.com/search/foo", "GET", Destination::Document))
            .await
            .unwrap_err();
        assert_eq!(err.code.0, -32006);
    }

    #[tokio::test]
    async fn test_relative_url_rejected() {
        let state = state_with(FixedNetwork::default()).await;
        let err = fetch_impl(&state, params("/post", "GET", Destination::Document)).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }
}

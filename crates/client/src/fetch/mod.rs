//! Network access for the engine.
//!
//! The engine only sees the [`Fetcher`] trait. [`FetchClient`] implements it
//! on top of reqwest:
//!
//! - Any HTTP status is a successful fetch; only transport failures are errors.
//! - Bodies are returned whole. Size limits apply to cache writes, not here.
//! - Max redirects: 5
//! - No timeout unless one is configured.
//! - Responses from the configured origin are `basic`, everything else `cors`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use url::Url;

use offgrid_core::url::same_origin;
use offgrid_core::{AppConfig, Error, Headers, Request, Response, ResponseType};

/// Performs network requests on behalf of the engine.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a request from the network.
    ///
    /// Non-success statuses are returned as responses; `Err` means the
    /// network itself failed.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "offgrid/0.1")
    pub user_agent: String,

    /// Request timeout (default: none)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// The site's own origin, used to classify response types.
    pub origin: Url,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "offgrid/0.1".to_string(),
            timeout: None,
            max_redirects: 5,
            origin: Url::parse("http://localhost:8080").expect("static URL"),
        }
    }
}

impl FetchConfig {
    /// Derive fetch settings from the application configuration.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            origin,
            ..Default::default()
        })
    }
}

/// HTTP fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn response_type(&self, final_url: &Url) -> ResponseType {
        if same_origin(final_url, &self.config.origin) { ResponseType::Basic } else { ResponseType::Cors }
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {}", request.method)))?;

        let response = self
            .http
            .request(method, request.url.clone())
            .send()
            .await
            .map_err(|e| Error::FetchFailed(format!("network error: {}", e)))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .filter(|(name, _)| name != header::SET_COOKIE.as_str())
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::FetchFailed(format!("failed to read response: {}", e)))?;

        tracing::debug!(
            "fetched {} -> {} ({}) in {}ms ({} bytes)",
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        let response_type = self.response_type(&final_url);
        Ok(Response { status: status.as_u16(), response_type, url: Some(final_url), headers, body: bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "offgrid/0.1");
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app() {
        let app = AppConfig { origin: "https://blog.example.com".into(), timeout_ms: Some(1500), ..Default::default() };
        let config = FetchConfig::from_app(&app).unwrap();
        assert_eq!(config.origin.as_str(), "https://blog.example.com/");
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_response_type_by_origin() {
        let config = FetchConfig { origin: Url::parse("https://blog.example.com").unwrap(), ..Default::default() };
        let client = FetchClient::new(config).unwrap();
        let own = Url::parse("https://blog.example.com/post/1").unwrap();
        let other = Url::parse("https://fonts.example.net/a.css").unwrap();
        assert_eq!(client.response_type(&own), ResponseType::Basic);
        assert_eq!(client.response_type(&other), ResponseType::Cors);
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_network_error() {
        let config = FetchConfig { timeout: Some(Duration::from_millis(500)), ..Default::default() };
        let client = FetchClient::new(config).unwrap();
        let request = Request::get(Url::parse("http://127.0.0.1:9/").unwrap());
        let err = client.fetch(&request).await.unwrap_err();
        assert!(err.is_network(), "unexpected error: {err}");
    }

    /// Serve one HTTP response with `body` on a local port.
    async fn serve_once(body: Vec<u8>) -> Url {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: image/png\r\ncontent-length: {}\r\n{}\r\n",
                body.len(),
                "set-cookie: s=1\r\nconnection: close\r\n"
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        Url::parse(&format!("http://{addr}/large.png")).unwrap()
    }

    #[tokio::test]
    async fn test_large_body_returned_whole() {
        let body: Vec<u8> = (0..8 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
        let url = serve_once(body.clone()).await;
        let config = FetchConfig { origin: url.clone(), ..Default::default() };
        let client = FetchClient::new(config).unwrap();

        let response = client.fetch(&Request::get(url)).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.response_type, ResponseType::Basic);
        assert_eq!(response.body.len(), body.len());
        assert_eq!(response.body, body);
        assert_eq!(response.content_type(), Some("image/png"));
        assert!(response.headers.get("set-cookie").is_none());
    }
}

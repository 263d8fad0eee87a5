//! Request classification and cache-write eligibility.
//!
//! Everything here is a pure function of the request (and, for writes, the
//! response). Nothing touches the store or the network, so decisions can be
//! re-evaluated any number of times with identical results.

use serde::{Deserialize, Serialize};
use url::Url;

use offgrid_core::url::same_origin;
use offgrid_core::{AppConfig, ConfigError, Destination, Request, Response, ResponseType};

/// What the interceptor does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Not intercepted; the default network path handles it untouched.
    Bypass,
    /// Network only. Failures propagate; nothing is cached or synthesized.
    NetworkOnly,
    /// Serve from a partition when present, otherwise fetch and maybe store.
    CacheFirst,
}

/// Classification rules built from configuration.
#[derive(Debug, Clone)]
pub struct Policy {
    origin: Url,
    network_first_patterns: Vec<String>,
    excluded_schemes: Vec<String>,
}

impl Policy {
    pub fn new(origin: Url, network_first_patterns: Vec<String>, excluded_schemes: Vec<String>) -> Self {
        let excluded_schemes = excluded_schemes
            .into_iter()
            .map(|s| s.trim_end_matches("://").trim_end_matches(':').to_ascii_lowercase())
            .collect();
        Self { origin, network_first_patterns, excluded_schemes }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.origin_url()?, config.network_first_patterns.clone(), config.excluded_schemes.clone()))
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Pick a strategy. Rules are evaluated in order; the first match wins.
    pub fn classify(&self, request: &Request) -> Strategy {
        if !request.is_get() {
            return Strategy::Bypass;
        }

        if self.excluded_schemes.iter().any(|s| s == request.url.scheme()) {
            return Strategy::Bypass;
        }

        let url = request.url.as_str();
        if self.network_first_patterns.iter().any(|p| url.contains(p.as_str())) {
            return Strategy::NetworkOnly;
        }

        Strategy::CacheFirst
    }

    /// Whether a network response may be stored at all.
    ///
    /// Only complete, same-origin `200` responses qualify; error statuses and
    /// cross-origin responses would poison the cache.
    pub fn is_cacheable_response(&self, response: &Response) -> bool {
        response.status == 200 && response.response_type == ResponseType::Basic
    }

    /// Whether a qualifying response is persisted into the dynamic partition.
    ///
    /// Narrower than read eligibility: the site's own pages, or any image or
    /// document.
    pub fn is_write_eligible(&self, request: &Request) -> bool {
        same_origin(&request.url, &self.origin)
            || matches!(request.destination, Destination::Image | Destination::Document)
    }
}

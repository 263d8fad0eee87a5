//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OFFGRID_*)
//! 2. TOML config file (if OFFGRID_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod partitions;
mod validation;

pub use partitions::PartitionNames;
pub use validation::ConfigError;

use crate::url::canonicalize;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OFFGRID_*)
/// 2. TOML config file (if OFFGRID_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version token embedded in every partition name.
    ///
    /// Set via OFFGRID_VERSION. Changing it makes every existing partition
    /// stale on the next activation.
    #[serde(default = "default_version")]
    pub version: String,

    /// Prefix for partition names.
    ///
    /// Set via OFFGRID_CACHE_PREFIX.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// The site's own origin.
    ///
    /// Set via OFFGRID_ORIGIN.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Shell assets fetched into the static partition on install.
    ///
    /// Relative entries are resolved against `origin`.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// URL substrings that are always fetched from the network, never cached.
    #[serde(default = "default_network_first_patterns")]
    pub network_first_patterns: Vec<String>,

    /// URL schemes that are never intercepted.
    #[serde(default = "default_excluded_schemes")]
    pub excluded_schemes: Vec<String>,

    /// Path to SQLite cache database.
    ///
    /// Set via OFFGRID_DB_PATH.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Maximum entries per partition. Unlimited when unset.
    ///
    /// Set via OFFGRID_MAX_ENTRIES.
    #[serde(default)]
    pub max_entries: Option<usize>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via OFFGRID_USER_AGENT.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Largest response body written to the cache. Bigger responses are still
    /// returned to the page, just not stored.
    ///
    /// Set via OFFGRID_MAX_BYTES.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds. No timeout when unset.
    ///
    /// Set via OFFGRID_TIMEOUT_MS.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Tag the host uses when connectivity returns.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Defaults applied to push notifications.
    #[serde(default)]
    pub notification: NotificationDefaults,
}

/// Fallback values for fields missing from a push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub url: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub open_label: String,
    pub open_icon: String,
    pub close_label: String,
    pub close_icon: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "New article".into(),
            body: "Fresh content is waiting for you.".into(),
            url: "/".into(),
            icon: "/icon-192x192.png".into(),
            badge: "/icon-72x72.png".into(),
            vibrate: vec![100, 50, 100],
            open_label: "Read the article".into(),
            open_icon: "/icon-read-32x32.png".into(),
            close_label: "Close".into(),
            close_icon: "/icon-close-32x32.png".into(),
        }
    }
}

fn default_version() -> String {
    "v1.0.0".into()
}

fn default_cache_prefix() -> String {
    "offgrid".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_static_assets() -> Vec<String> {
    vec![
        "/".into(),
        "/favicon.ico".into(),
        "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap".into(),
        "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css".into(),
    ]
}

fn default_network_first_patterns() -> Vec<String> {
    vec![
        "/search/".into(),
        "/feeds/".into(),
        "google-analytics.com".into(),
        "googletagmanager.com".into(),
        "googlesyndication.com".into(),
        "doubleclick.net".into(),
    ]
}

fn default_excluded_schemes() -> Vec<String> {
    vec!["chrome-extension".into(), "moz-extension".into(), "safari-web-extension".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offgrid-cache.sqlite")
}

fn default_user_agent() -> String {
    "offgrid/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_sync_tag() -> String {
    "background-sync".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            cache_prefix: default_cache_prefix(),
            origin: default_origin(),
            static_assets: default_static_assets(),
            network_first_patterns: default_network_first_patterns(),
            excluded_schemes: default_excluded_schemes(),
            db_path: default_db_path(),
            max_entries: None,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: None,
            sync_tag: default_sync_tag(),
            notification: NotificationDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Partition names for the running version.
    pub fn partitions(&self) -> PartitionNames {
        PartitionNames::new(&self.cache_prefix, &self.version)
    }

    /// The site origin as a parsed URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Static assets resolved to absolute URLs, in configured order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first entry that does not resolve.
    pub fn static_asset_urls(&self) -> Result<Vec<Url>, ConfigError> {
        let origin = self.origin_url()?;
        self.static_assets
            .iter()
            .map(|asset| {
                canonicalize(asset, Some(&origin)).map_err(|e| ConfigError::Invalid {
                    field: "static_assets".into(),
                    reason: format!("{asset}: {e}"),
                })
            })
            .collect()
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OFFGRID_`
    /// 2. TOML file from `OFFGRID_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFGRID_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFGRID_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

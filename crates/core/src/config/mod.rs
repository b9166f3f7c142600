//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WAHLINFO_SW_*)
//! 2. TOML config file (if WAHLINFO_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WAHLINFO_SW_*)
/// 2. TOML config file (if WAHLINFO_SW_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// List values in environment variables use array syntax, e.g.
/// `WAHLINFO_SW_EXCLUDED_HOSTS='["tile.openstreetmap.org"]'`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Build/version tag embedded in every store name.
    ///
    /// Set via WAHLINFO_SW_VERSION_TAG environment variable.
    #[serde(default = "default_version_tag")]
    pub version_tag: String,

    /// Name prefix of the app shell / static asset store.
    #[serde(default = "default_shell_prefix")]
    pub shell_store_prefix: String,

    /// Name prefix of the runtime (API, navigation) store.
    #[serde(default = "default_runtime_prefix")]
    pub runtime_store_prefix: String,

    /// Origin the application is served from; relative URLs resolve against it.
    ///
    /// Set via WAHLINFO_SW_APP_ORIGIN environment variable.
    #[serde(default = "default_app_origin")]
    pub app_origin: String,

    /// App shell URLs fetched and stored on install.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Offline placeholder page served for failed navigations. Must be precached.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Path prefix of the data API (API Gateway stage).
    #[serde(default = "default_api_path_prefix")]
    pub api_path_prefix: String,

    /// Data endpoints recognized as API reads.
    #[serde(default = "default_api_endpoints")]
    pub api_endpoints: Vec<String>,

    /// Host substrings identifying the API gateway.
    #[serde(default = "default_api_host_patterns")]
    pub api_host_patterns: Vec<String>,

    /// Hosts (and their subdomains) that are never cached and never fail loudly.
    #[serde(default = "default_excluded_hosts")]
    pub excluded_hosts: Vec<String>,

    /// Activate a freshly installed worker without waiting for the old one.
    ///
    /// Set via WAHLINFO_SW_SKIP_WAITING environment variable.
    #[serde(default)]
    pub skip_waiting: bool,

    /// Take control of open application instances right after activation.
    ///
    /// Set via WAHLINFO_SW_CLAIM_CLIENTS environment variable.
    #[serde(default = "default_true")]
    pub claim_clients: bool,

    /// Path to the SQLite database holding all cache stores.
    ///
    /// Set via WAHLINFO_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via WAHLINFO_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Seconds between background reminder checks.
    #[serde(default = "default_reminder_interval_secs")]
    pub reminder_interval_secs: u64,

    /// Notification title used when a push payload carries none.
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

fn default_version_tag() -> String {
    "v2.0.0".into()
}

fn default_shell_prefix() -> String {
    "shell".into()
}

fn default_runtime_prefix() -> String {
    "runtime".into()
}

fn default_app_origin() -> String {
    "http://localhost:4173".into()
}

fn default_precache_urls() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/offline.html",
        "/manifest.webmanifest",
        "/icons/icon-192x192.png",
        "/icons/icon-512x512.png",
        "/splash/splash-1170x2532.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_api_path_prefix() -> String {
    "/dev".into()
}

fn default_api_endpoints() -> Vec<String> {
    ["parteien", "kandidaten", "wahllokale", "wahltermine"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_api_host_patterns() -> Vec<String> {
    vec!["execute-api".into()]
}

fn default_excluded_hosts() -> Vec<String> {
    vec!["tile.openstreetmap.org".into()]
}

fn default_true() -> bool {
    true
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./wahlinfo-sw-cache.sqlite")
}

fn default_user_agent() -> String {
    "wahlinfo-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_reminder_interval_secs() -> u64 {
    60
}

fn default_app_name() -> String {
    "Wahl-Info".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version_tag: default_version_tag(),
            shell_store_prefix: default_shell_prefix(),
            runtime_store_prefix: default_runtime_prefix(),
            app_origin: default_app_origin(),
            precache_urls: default_precache_urls(),
            offline_page: default_offline_page(),
            api_path_prefix: default_api_path_prefix(),
            api_endpoints: default_api_endpoints(),
            api_host_patterns: default_api_host_patterns(),
            excluded_hosts: default_excluded_hosts(),
            skip_waiting: false,
            claim_clients: true,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            reminder_interval_secs: default_reminder_interval_secs(),
            app_name: default_app_name(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Interval of the background reminder check.
    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_interval_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WAHLINFO_SW_`
    /// 2. TOML file from `WAHLINFO_SW_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("WAHLINFO_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WAHLINFO_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Same configuration with a different version tag (for rolling out updates).
    pub fn with_version(&self, version_tag: impl Into<String>) -> Self {
        Self { version_tag: version_tag.into(), ..self.clone() }
    }
}

//! Request classification.
//!
//! Every intercepted request maps to exactly one [`RequestClass`] before any
//! strategy runs. Classification looks only at method, URL, destination and
//! mode, so it is a pure function that can be tested with hand-built requests.
//!
//! Evaluation order:
//! 1. non-GET -> `Ignored(NonGet)`
//! 2. excluded host (or subdomain) -> `Ignored(ExcludedHost)`
//! 3. gateway host or data endpoint path -> `ApiRead`; for navigations the
//!    bare `/<endpoint>` suffix is not enough because the app has page routes
//!    with the same names
//! 4. `mode == navigate` -> `Navigation`
//! 5. asset path or asset destination -> `StaticAsset`
//! 6. anything else -> `Other`

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::config::AppConfig;
use crate::request::{Destination, Method, Request, RequestMode};

/// Hashed bundle output, icons and map marker images.
const ASSET_PATTERN: &str =
    r"^/(?:assets/.+\.(?:js|mjs|css|png|svg|jpe?g|webp|gif|ico|woff2?)|icons/.+|navigation/.+)$";

/// Why a request is left alone by the caching strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Mutating or otherwise non-GET request: never intercepted.
    NonGet,
    /// Third-party host on the exclusion list (map tiles).
    ExcludedHost,
}

/// Request class deciding the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "class", content = "reason")]
pub enum RequestClass {
    ApiRead,
    Navigation,
    StaticAsset,
    Ignored(IgnoreReason),
    Other,
}

/// Classification rules compiled from configuration.
#[derive(Debug, Clone)]
pub struct Classifier {
    api_path_prefix: String,
    api_endpoints: Vec<String>,
    api_host_patterns: Vec<String>,
    excluded_hosts: Vec<String>,
    asset_path: Regex,
}

impl Classifier {
    pub fn new(
        api_path_prefix: &str, api_endpoints: &[String], api_host_patterns: &[String], excluded_hosts: &[String],
    ) -> Result<Self, Error> {
        let asset_path = Regex::new(ASSET_PATTERN).map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self {
            api_path_prefix: api_path_prefix.trim_end_matches('/').to_string(),
            api_endpoints: api_endpoints
                .iter()
                .map(|e| e.trim_matches('/').to_string())
                .filter(|e| !e.is_empty())
                .collect(),
            api_host_patterns: api_host_patterns.iter().map(|h| h.to_lowercase()).collect(),
            excluded_hosts: excluded_hosts
                .iter()
                .map(|h| h.trim_start_matches('.').to_lowercase())
                .collect(),
            asset_path,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(
            &config.api_path_prefix,
            &config.api_endpoints,
            &config.api_host_patterns,
            &config.excluded_hosts,
        )
    }

    /// Classify a request. Total: every request gets exactly one class.
    pub fn classify(&self, request: &Request) -> RequestClass {
        if request.method != Method::Get {
            return RequestClass::Ignored(IgnoreReason::NonGet);
        }

        let host = request.url.host_str().unwrap_or_default();
        if self.is_excluded_host(host) {
            return RequestClass::Ignored(IgnoreReason::ExcludedHost);
        }

        let navigate = request.mode == RequestMode::Navigate;
        if self.is_api(host, request.url.path(), navigate) {
            return RequestClass::ApiRead;
        }

        if navigate {
            return RequestClass::Navigation;
        }

        if self.is_asset(request) {
            return RequestClass::StaticAsset;
        }

        RequestClass::Other
    }

    fn is_excluded_host(&self, host: &str) -> bool {
        self.excluded_hosts.iter().any(|excluded| {
            host == excluded
                || host
                    .strip_suffix(excluded.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        })
    }

    fn is_api(&self, host: &str, path: &str, navigate: bool) -> bool {
        if self.api_host_patterns.iter().any(|p| !p.is_empty() && host.contains(p.as_str())) {
            return true;
        }

        let path = path.trim_end_matches('/');
        self.api_endpoints.iter().any(|endpoint| {
            let prefixed = format!("{}/{endpoint}", self.api_path_prefix);
            path == prefixed
                || path.starts_with(&format!("{prefixed}/"))
                || (!navigate && path.ends_with(&format!("/{endpoint}")))
        })
    }

    fn is_asset(&self, request: &Request) -> bool {
        matches!(
            request.destination,
            Destination::Script | Destination::Style | Destination::Image | Destination::Font | Destination::Manifest
        ) || self.asset_path.is_match(request.url.path())
    }
}

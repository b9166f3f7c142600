//! Offline cache controller.
//!
//! The controller sits between the application and the network. It owns two
//! version-tagged cache stores (`shell-<tag>` for the app shell and static
//! assets, `runtime-<tag>` for API and navigation responses) and answers every
//! intercepted request with the strategy its [`RequestClass`] calls for:
//!
//! | Class        | Network OK                 | Offline, cached | Offline, not cached        |
//! |--------------|----------------------------|-----------------|----------------------------|
//! | api-read     | serve + store              | never consulted | 503 JSON `{"error":"offline"}` |
//! | navigation   | serve + store (best-effort)| serve cached    | offline page, else 503 text |
//! | static-asset | cache hit skips network    | serve cached    | 503 empty                  |
//! | excluded     | serve                      | n/a             | 200 empty                  |
//!
//! Lifecycle: `Installing -> Installed -> Activating -> Active`, or
//! `Redundant` after a failed install or once superseded.
//!
//! [`RequestClass`]: crate::classify::RequestClass

pub mod controller;
pub mod fallback;
pub mod messages;
pub mod registration;
mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::config::AppConfig;
use crate::reminders::Notification;
use crate::request::{Request, Response, canonicalize};

pub use controller::CacheController;
pub use messages::{ClientMessage, MessageReply, PushPayload};
pub use registration::{Registration, UpdateOutcome};

/// Performs real network requests on behalf of the controller.
///
/// `Ok` means the server answered (any status); `Err` means it did not.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Outcome of routing one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intercept {
    /// Not intercepted: the host performs the request untouched.
    PassThrough,
    /// Answer with this response.
    Respond(Response),
    /// Answer with a network error, as the page would see without a worker.
    NetworkError(String),
}

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Installing,
    /// Installed and waiting to activate.
    Installed,
    Activating,
    Active,
    Redundant,
}

/// Names of the two stores belonging to one worker version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StoreNames {
    pub version_tag: String,
    pub shell: String,
    pub runtime: String,
}

impl StoreNames {
    pub fn new(shell_prefix: &str, runtime_prefix: &str, version_tag: &str) -> Self {
        Self {
            version_tag: version_tag.to_string(),
            shell: format!("{shell_prefix}-{version_tag}"),
            runtime: format!("{runtime_prefix}-{version_tag}"),
        }
    }

    /// True if `name` is one of this version's stores.
    pub fn owns(&self, name: &str) -> bool {
        name == self.shell || name == self.runtime
    }
}

/// Everything a controller generation needs, resolved up front.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub stores: StoreNames,
    pub origin: Url,
    pub precache: Vec<Url>,
    pub offline_page: Url,
    pub skip_waiting: bool,
    pub claim_clients: bool,
    pub app_name: String,
}

impl WorkerConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = canonicalize(&config.app_origin, None)?;
        let mut precache: Vec<Url> = Vec::with_capacity(config.precache_urls.len());
        for raw in &config.precache_urls {
            let url = canonicalize(raw, Some(&origin))?;
            if !precache.contains(&url) {
                precache.push(url);
            }
        }
        let offline_page = canonicalize(&config.offline_page, Some(&origin))?;

        Ok(Self {
            stores: StoreNames::new(&config.shell_store_prefix, &config.runtime_store_prefix, &config.version_tag),
            origin,
            precache,
            offline_page,
            skip_waiting: config.skip_waiting,
            claim_clients: config.claim_clients,
            app_name: config.app_name.clone(),
        })
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    pub store: String,
    pub entries: usize,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivationReport {
    pub version_tag: String,
    /// Superseded stores removed before taking control.
    pub deleted_stores: Vec<String>,
    pub claimed_clients: bool,
}

/// One event method per worker event.
#[async_trait]
pub trait ServiceWorker: Send + Sync {
    fn version_tag(&self) -> &str;

    /// Whether this generation activates without waiting for the previous one.
    fn skips_waiting(&self) -> bool;

    async fn state(&self) -> WorkerState;

    /// Populate the shell store. On failure the worker never activates.
    async fn on_install(&self) -> Result<InstallReport, Error>;

    /// Delete superseded stores, then take control.
    async fn on_activate(&self) -> Result<ActivationReport, Error>;

    /// Answer an intercepted request. Never fails.
    async fn route(&self, request: &Request) -> Intercept;

    async fn on_message(&self, message: ClientMessage) -> Result<MessageReply, Error>;

    async fn on_push(&self, payload: Option<&str>) -> Result<Notification, Error>;

    /// Background wake-up: notify any reminder that became due.
    async fn on_periodic_check(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, Error>;

    /// Mark this generation as superseded.
    async fn retire(&self);
}

//! Per-class caching strategies.
//!
//! Every strategy ends in an [`Intercept`]; store and network failures are
//! folded into fallbacks here and never escape to the caller.

use super::controller::CacheController;
use super::{Intercept, Network, WorkerState, fallback};
use crate::Error;
use crate::cache::CacheStorage;
use crate::request::{Method, Request, Response};

impl<S: CacheStorage, N: Network> CacheController<S, N> {
    /// Store a copy of `response` under `request`. Non-2xx responses are
    /// skipped and reported as `Ok(false)`.
    pub(super) async fn try_store(&self, store: &str, request: &Request, response: &Response) -> Result<bool, Error> {
        if !response.is_success() {
            return Ok(false);
        }
        self.storage.put(store, &request.key(), response).await?;
        Ok(true)
    }

    /// [`Self::try_store`] with the failure logged and dropped. Skipped once
    /// this generation is no longer active, since its stores may be gone.
    async fn store_best_effort(&self, store: &str, request: &Request, response: &Response) {
        if *self.state.read().await != WorkerState::Active {
            tracing::debug!(store, url = %request.url, "worker retired, not caching");
            return;
        }
        match self.try_store(store, request, response).await {
            Ok(true) => tracing::debug!(store, url = %request.url, "cached response"),
            Ok(false) => {
                tracing::debug!(store, url = %request.url, status = response.status, "not caching non-success response")
            }
            Err(e) => tracing::warn!(store, url = %request.url, error = %e, "cache write failed"),
        }
    }

    /// Cache lookup where a storage error counts as a miss.
    async fn lookup(&self, store: Option<&str>, request: &Request) -> Option<Response> {
        let key = request.key();
        let result = match store {
            Some(store) => self.storage.match_in(store, &key).await,
            None => self.storage.match_any(&key).await,
        };
        result.unwrap_or_else(|e| {
            tracing::warn!(url = %request.url, error = %e, "cache read failed");
            None
        })
    }

    /// API reads: live data or an explicit offline error, never a stale copy.
    pub(super) async fn network_first_no_stale(&self, request: &Request) -> Intercept {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_best_effort(&self.config.stores.runtime, request, &response).await;
                Intercept::Respond(response)
            }
            Err(e) => {
                tracing::info!(url = %request.url, error = %e, "api read offline");
                Intercept::Respond(fallback::offline_api_error(&request.url))
            }
        }
    }

    /// Navigations: network, then any cached copy, then the offline page.
    pub(super) async fn app_shell(&self, request: &Request) -> Intercept {
        let error = match self.network.fetch(request).await {
            Ok(response) => {
                self.store_best_effort(&self.config.stores.runtime, request, &response).await;
                return Intercept::Respond(response);
            }
            Err(e) => e,
        };
        tracing::info!(url = %request.url, error = %error, "navigation offline");

        if let Some(cached) = self.lookup(None, request).await {
            return Intercept::Respond(cached);
        }

        let offline = Request::new(Method::Get, self.config.offline_page.clone());
        if let Some(page) = self.lookup(Some(self.config.stores.shell.as_str()), &offline).await {
            return Intercept::Respond(page);
        }

        tracing::warn!(store = %self.config.stores.shell, "offline page missing from shell store");
        Intercept::Respond(fallback::offline_navigation())
    }

    /// Static assets: a cache hit never touches the network.
    pub(super) async fn cache_first(&self, request: &Request) -> Intercept {
        if let Some(cached) = self.lookup(Some(self.config.stores.shell.as_str()), request).await {
            return Intercept::Respond(cached);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_best_effort(&self.config.stores.shell, request, &response).await;
                Intercept::Respond(response)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "asset unavailable");
                Intercept::Respond(fallback::asset_unavailable())
            }
        }
    }

    /// Excluded hosts: straight to the network, failures suppressed.
    pub(super) async fn network_or_empty(&self, request: &Request) -> Intercept {
        match self.network.fetch(request).await {
            Ok(response) => Intercept::Respond(response),
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "suppressing excluded host failure");
                Intercept::Respond(fallback::suppressed())
            }
        }
    }

    /// Unclassified GETs: network, then any cached copy, else the error.
    pub(super) async fn network_then_cache(&self, request: &Request) -> Intercept {
        match self.network.fetch(request).await {
            Ok(response) => Intercept::Respond(response),
            Err(e) => match self.lookup(None, request).await {
                Some(cached) => Intercept::Respond(cached),
                None => Intercept::NetworkError(e.to_string()),
            },
        }
    }
}

//! cache_purge tool implementation.
//!
//! Deletes one named store, or every store owned by neither the active nor
//! the waiting generation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use wahlinfo_core::worker::{Network, Registration};
use wahlinfo_core::{CacheDb, CacheStorage, Error};

use crate::tools::{HostWorker, json_result};

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Delete this store.
    #[serde(default)]
    pub store: Option<String>,

    /// Delete every store not owned by the active or waiting generation.
    #[serde(default)]
    pub stale: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Names of the deleted stores.
    pub deleted: Vec<String>,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl<N: Network>(
    registration: &Registration<HostWorker<N>>, cache: &CacheDb, params: CachePurgeParams,
) -> Result<CallToolResult, McpError> {
    if params.store.is_none() && !params.stale {
        return Err(Error::InvalidInput("At least one of store or stale must be specified".to_string()).into());
    }

    let mut deleted = Vec::new();

    if let Some(store) = params.store {
        if !cache.delete_store(&store).await? {
            return Err(Error::StoreNotFound(store).into());
        }
        deleted.push(store);
    }

    if params.stale {
        let active = registration
            .active()
            .await
            .ok_or_else(|| Error::InvalidState("no active worker".into()))?;
        let waiting = registration.waiting().await;
        let owned = |name: &str| {
            active.config().stores.owns(name) || waiting.as_ref().is_some_and(|w| w.config().stores.owns(name))
        };
        for name in cache.store_names().await? {
            if !owned(&name) && cache.delete_store(&name).await? {
                deleted.push(name);
            }
        }
    }

    tracing::info!(deleted = deleted.len(), "cache stores purged");
    json_result(&CachePurgeOutput { deleted })
}

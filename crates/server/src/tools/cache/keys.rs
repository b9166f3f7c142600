//! cache_keys tool implementation.
//!
//! Lists the request keys held by one named store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use wahlinfo_core::request::RequestKey;
use wahlinfo_core::{CacheDb, CacheStorage, Error};

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Store name, e.g. "shell-v2.0.0".
    pub store: String,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub store: String,
    /// Keys in insertion order.
    pub keys: Vec<RequestKey>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(cache: &CacheDb, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    if !cache.has_store(&params.store).await? {
        return Err(Error::StoreNotFound(params.store).into());
    }

    let keys = cache.keys(&params.store).await?;
    json_result(&CacheKeysOutput { store: params.store, keys })
}

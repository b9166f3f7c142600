//! MCP tool implementations.
//!
//! Each tool is a plain async function over the registration and cache so it
//! can be tested without a transport.

pub mod cache;
pub mod fetch;
pub mod message;
pub mod status;
pub mod update;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use wahlinfo_core::CacheDb;
use wahlinfo_core::worker::CacheController;

use crate::error::HostError;

pub use cache::{CacheKeysParams, CachePurgeParams, keys_impl, purge_impl};
pub use fetch::{SwFetchParams, fetch_impl};
pub use message::{SwMessageParams, SwPushParams, message_impl, push_impl};
pub use status::status_impl;
pub use update::{SwUpdateParams, update_impl};

/// Controller generation as hosted here: SQLite stores over network `N`.
pub type HostWorker<N> = CacheController<CacheDb, N>;

/// Pretty-printed JSON text result.
pub(crate) fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| HostError::Serialize(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

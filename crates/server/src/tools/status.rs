//! sw_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use wahlinfo_core::cache::StoreInfo;
use wahlinfo_core::worker::{Network, Registration, ServiceWorker, StoreNames, WorkerState};
use wahlinfo_core::{CacheDb, CacheStorage};

use super::{HostWorker, json_result};

/// One worker generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSummary {
    pub state: WorkerState,
    pub stores: StoreNames,
}

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusOutput {
    pub active: Option<WorkerSummary>,
    pub waiting: Option<WorkerSummary>,
    /// Every store in the database, oldest first.
    pub stores: Vec<StoreInfo>,
}

async fn summarize<N: Network>(worker: Option<std::sync::Arc<HostWorker<N>>>) -> Option<WorkerSummary> {
    let worker = worker?;
    Some(WorkerSummary { state: worker.state().await, stores: worker.config().stores.clone() })
}

/// Implementation of the sw_status tool.
pub async fn status_impl<N: Network>(
    registration: &Registration<HostWorker<N>>, db: &CacheDb,
) -> Result<CallToolResult, McpError> {
    let output = SwStatusOutput {
        active: summarize(registration.active().await).await,
        waiting: summarize(registration.waiting().await).await,
        stores: db.store_infos().await?,
    };
    json_result(&output)
}

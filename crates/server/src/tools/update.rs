//! sw_update tool implementation.
//!
//! Registers a new controller generation for another version tag, as a
//! deployment of a new build would.

use std::sync::Arc;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use wahlinfo_core::reminders::Notifier;
use wahlinfo_core::worker::{Network, Registration, ServiceWorker};
use wahlinfo_core::{AppConfig, CacheDb, Error};

use super::{HostWorker, json_result};
use crate::error::HostError;

/// Parameters for the sw_update tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwUpdateParams {
    /// Version tag of the new build, e.g. "v2.1.0".
    pub version_tag: String,

    /// Override the configured skip-waiting switch for this update.
    #[serde(default)]
    pub skip_waiting: Option<bool>,
}

/// Implementation of the sw_update tool.
pub async fn update_impl<N: Network + Clone>(
    registration: &Registration<HostWorker<N>>, base: &AppConfig, db: &CacheDb, network: &N,
    notifier: Arc<dyn Notifier>, params: SwUpdateParams,
) -> Result<CallToolResult, McpError> {
    let mut config = base.with_version(params.version_tag.trim());
    if let Some(skip_waiting) = params.skip_waiting {
        config.skip_waiting = skip_waiting;
    }
    config.validate().map_err(|e| HostError::InvalidConfig(e.to_string()))?;

    if let Some(active) = registration.active().await
        && active.version_tag() == config.version_tag
    {
        return Err(Error::InvalidInput(format!("{} is already active", config.version_tag)).into());
    }

    let worker = HostWorker::from_app(&config, db.clone(), network.clone(), notifier)?;
    let outcome = registration.register(worker).await?;
    tracing::info!(version = %config.version_tag, ?outcome, "update registered");
    json_result(&outcome)
}

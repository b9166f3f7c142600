//! sw_message and sw_push tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use wahlinfo_core::worker::{ClientMessage, Network, Registration};

use super::{HostWorker, json_result};

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message as posted by the application, e.g. `{"type": "CHECK_REMINDERS"}`.
    pub message: ClientMessage,
}

/// Implementation of the sw_message tool.
pub async fn message_impl<N: Network>(
    registration: &Registration<HostWorker<N>>, params: SwMessageParams,
) -> Result<CallToolResult, McpError> {
    let reply = registration.post_message(params.message).await?;
    json_result(&reply)
}

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push payload; JSON `{"title", "body", "tag"}` or plain text.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Implementation of the sw_push tool.
pub async fn push_impl<N: Network>(
    registration: &Registration<HostWorker<N>>, params: SwPushParams,
) -> Result<CallToolResult, McpError> {
    let notification = registration.push(params.payload.as_deref()).await?;
    json_result(&notification)
}

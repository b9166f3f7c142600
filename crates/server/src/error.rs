//! Structured errors raised by the host itself.
//!
//! Controller and cache failures arrive as `wahlinfo_core::Error`; these cover
//! what only the host can get wrong.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A configuration override produced an invalid configuration.
    #[error("INVALID_CONFIG: {0}")]
    InvalidConfig(String),

    /// Tool output could not be serialized.
    #[error("SERIALIZE_FAILED: {0}")]
    Serialize(String),
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        let code = match &err {
            HostError::InvalidConfig(_) => -32602,
            HostError::Serialize(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

//! Control messages between application instances and the worker.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::WorkerState;
use crate::Error;
use crate::reminders::{Notification, Reminder};

/// Message posted by an application instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Check reminders now. A supplied list replaces the one the worker holds.
    CheckReminders {
        #[serde(default)]
        reminders: Option<Vec<Reminder>>,
        #[serde(default)]
        now: Option<DateTime<Utc>>,
    },
    /// Hand the worker the current reminder list for background checks.
    SyncReminders { reminders: Vec<Reminder> },
    /// Activate the waiting worker right away.
    SkipWaiting,
    GetVersion,
    /// Drop every cached API and navigation response.
    ClearRuntimeCache,
}

impl ClientMessage {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::InvalidMessage(e.to_string()))
    }
}

/// Reply sent back to the posting application instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageReply {
    Notified { notifications: Vec<Notification> },
    RemindersSynced { count: usize },
    Version { version_tag: String, state: WorkerState, stores: Vec<String> },
    RuntimeCacheCleared { store: String },
    /// Waiting worker promoted; `version_tag` is now active.
    Activated { version_tag: String },
    Ack,
}

/// Push message payload. Both fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl PushPayload {
    /// Lenient parse: a missing or non-JSON payload becomes the default.
    pub fn parse(payload: Option<&str>) -> Self {
        match payload {
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| Self {
                body: Some(raw.trim().to_string()).filter(|b| !b.is_empty()),
                ..Default::default()
            }),
            None => Self::default(),
        }
    }
}

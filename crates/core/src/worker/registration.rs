//! Active and waiting worker generations.
//!
//! A new generation installs next to the active one and only replaces it once
//! activation (including store garbage collection) has finished. Promotion
//! holds the active slot while it activates, so requests that arrive meanwhile
//! are routed to the new generation. Requests already in flight finish on the
//! generation that picked them up; a retired generation no longer writes to
//! its stores.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{ActivationReport, ClientMessage, Intercept, MessageReply, ServiceWorker};
use crate::Error;
use crate::reminders::Notification;
use crate::request::Request;

/// What happened to a newly registered generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Activated(ActivationReport),
    /// Installed; waits until the active generation lets go.
    Waiting { version_tag: String },
}

/// Holds the active generation and at most one waiting generation.
pub struct Registration<W> {
    active: RwLock<Option<Arc<W>>>,
    waiting: RwLock<Option<Arc<W>>>,
}

impl<W> Default for Registration<W> {
    fn default() -> Self {
        Self { active: RwLock::new(None), waiting: RwLock::new(None) }
    }
}

impl<W: ServiceWorker> Registration<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active(&self) -> Option<Arc<W>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<W>> {
        self.waiting.read().await.clone()
    }

    /// Install `worker`, then activate it if nothing is active or it skips
    /// waiting. A failed install leaves the current generation in place.
    pub async fn register(&self, worker: W) -> Result<UpdateOutcome, Error> {
        let worker = Arc::new(worker);
        let version_tag = worker.version_tag().to_string();
        worker.on_install().await?;

        let has_active = self.active.read().await.is_some();
        if has_active && !worker.skips_waiting() {
            if let Some(superseded) = self.waiting.write().await.replace(worker) {
                tracing::info!(version = %superseded.version_tag(), "replacing waiting worker");
                superseded.retire().await;
            }
            tracing::info!(version = %version_tag, "worker installed, waiting");
            return Ok(UpdateOutcome::Waiting { version_tag });
        }

        if let Some(superseded) = self.waiting.write().await.take() {
            superseded.retire().await;
        }
        match self.promote(Arc::clone(&worker)).await {
            Ok(report) => Ok(UpdateOutcome::Activated(report)),
            Err(e) => {
                *self.waiting.write().await = Some(worker);
                Err(e)
            }
        }
    }

    /// Activate the waiting generation now. `None` if nothing is waiting.
    pub async fn skip_waiting(&self) -> Result<Option<ActivationReport>, Error> {
        let Some(worker) = self.waiting.write().await.take() else {
            return Ok(None);
        };

        match self.promote(Arc::clone(&worker)).await {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                *self.waiting.write().await = Some(worker);
                Err(e)
            }
        }
    }

    async fn promote(&self, worker: Arc<W>) -> Result<ActivationReport, Error> {
        let mut active = self.active.write().await;
        let report = worker.on_activate().await?;
        if let Some(previous) = active.replace(worker) {
            tracing::info!(from = %previous.version_tag(), to = %report.version_tag, "worker superseded");
            previous.retire().await;
        }
        Ok(report)
    }

    /// Route through the active generation; pass through if there is none.
    pub async fn route(&self, request: &Request) -> Intercept {
        match self.active().await {
            Some(worker) => worker.route(request).await,
            None => Intercept::PassThrough,
        }
    }

    /// Deliver a client message. `SKIP_WAITING` is handled here.
    pub async fn post_message(&self, message: ClientMessage) -> Result<MessageReply, Error> {
        if matches!(message, ClientMessage::SkipWaiting) {
            return Ok(match self.skip_waiting().await? {
                Some(report) => MessageReply::Activated { version_tag: report.version_tag },
                None => MessageReply::Ack,
            });
        }

        match self.active().await {
            Some(worker) => worker.on_message(message).await,
            None => Err(Error::InvalidState("no active worker".into())),
        }
    }

    pub async fn push(&self, payload: Option<&str>) -> Result<Notification, Error> {
        match self.active().await {
            Some(worker) => worker.on_push(payload).await,
            None => Err(Error::InvalidState("no active worker".into())),
        }
    }

    /// Periodic wake-up. Without an active generation there is nothing to do.
    pub async fn periodic_check(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, Error> {
        match self.active().await {
            Some(worker) => worker.on_periodic_check(now).await,
            None => Ok(Vec::new()),
        }
    }
}

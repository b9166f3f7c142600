//! The cache controller: one worker generation bound to one version tag.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use super::{
    ActivationReport, ClientMessage, InstallReport, Intercept, MessageReply, Network, PushPayload, ServiceWorker,
    WorkerConfig, WorkerState,
};
use crate::Error;
use crate::cache::CacheStorage;
use crate::classify::{Classifier, IgnoreReason, RequestClass};
use crate::config::AppConfig;
use crate::reminders::{Notification, Notifier, ReminderBook};
use crate::request::{Method, Request, RequestKey, Response};

const DEFAULT_PUSH_BODY: &str = "Neue Informationen zur Wahl verfügbar.";

/// Offline cache controller for one version tag.
pub struct CacheController<S, N> {
    pub(super) config: WorkerConfig,
    classifier: Classifier,
    pub(super) storage: S,
    pub(super) network: N,
    notifier: Arc<dyn Notifier>,
    pub(super) state: RwLock<WorkerState>,
    reminders: Mutex<ReminderBook>,
}

impl<S: CacheStorage, N: Network> CacheController<S, N> {
    pub fn new(
        config: WorkerConfig, classifier: Classifier, storage: S, network: N, notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            classifier,
            storage,
            network,
            notifier,
            state: RwLock::new(WorkerState::Installing),
            reminders: Mutex::new(ReminderBook::default()),
        }
    }

    /// Build a controller for the version tag in `app`.
    pub fn from_app(app: &AppConfig, storage: S, network: N, notifier: Arc<dyn Notifier>) -> Result<Self, Error> {
        Ok(Self::new(WorkerConfig::from_app(app)?, Classifier::from_config(app)?, storage, network, notifier))
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn classify(&self, request: &Request) -> RequestClass {
        self.classifier.classify(request)
    }

    async fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        tracing::debug!(version = %self.config.stores.version_tag, from = ?*state, to = ?next, "worker state");
        *state = next;
    }

    /// Fetch the whole manifest, then write it in one transaction.
    async fn precache(&self) -> Result<InstallReport, Error> {
        let mut entries: Vec<(RequestKey, Response)> = Vec::with_capacity(self.config.precache.len());
        for url in &self.config.precache {
            let request = Request::new(Method::Get, url.clone());
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed { url: url.to_string(), reason: e.to_string() })?;
            if !response.is_success() {
                return Err(Error::InstallFailed { url: url.to_string(), reason: format!("HTTP {}", response.status) });
            }
            entries.push((request.key(), response));
        }

        self.storage.put_all(&self.config.stores.shell, &entries).await?;
        Ok(InstallReport { store: self.config.stores.shell.clone(), entries: entries.len() })
    }

    /// The shell store must hold the whole manifest before this version can
    /// take over.
    async fn verify_shell(&self) -> Result<(), Error> {
        let shell = &self.config.stores.shell;
        if !self.storage.has_store(shell).await? {
            return Err(Error::InvalidState(format!("shell store {shell} is missing")));
        }
        let entries = self.storage.keys(shell).await?.len();
        if entries < self.config.precache.len() {
            return Err(Error::InvalidState(format!(
                "shell store {shell} holds {entries} of {} precached entries",
                self.config.precache.len()
            )));
        }
        Ok(())
    }

    /// Delete every store this version does not own.
    async fn collect_garbage(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.storage.store_names().await? {
            if self.config.stores.owns(&name) {
                continue;
            }
            if self.storage.delete_store(&name).await? {
                tracing::info!(store = %name, "deleted superseded store");
                deleted.push(name);
            }
        }
        self.storage.open_store(&self.config.stores.runtime).await?;
        Ok(deleted)
    }

    /// Show each notification; delivery failures are logged, not returned.
    async fn deliver(&self, notifications: &[Notification]) {
        for notification in notifications {
            if let Err(e) = self.notifier.show(notification).await {
                tracing::warn!(tag = ?notification.tag, error = %e, "notification not delivered");
            }
        }
    }

    async fn check_reminders(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let due = self.reminders.lock().await.take_due(now, &self.config.app_name);
        self.deliver(&due).await;
        due
    }
}

#[async_trait]
impl<S: CacheStorage, N: Network> ServiceWorker for CacheController<S, N> {
    fn version_tag(&self) -> &str {
        &self.config.stores.version_tag
    }

    fn skips_waiting(&self) -> bool {
        self.config.skip_waiting
    }

    async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn on_install(&self) -> Result<InstallReport, Error> {
        let current = self.state().await;
        if current != WorkerState::Installing {
            return Err(Error::InvalidState(format!("cannot install from {current:?}")));
        }

        match self.precache().await {
            Ok(report) => {
                tracing::info!(store = %report.store, entries = report.entries, "install complete");
                self.set_state(WorkerState::Installed).await;
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(version = %self.config.stores.version_tag, error = %e, "install failed");
                self.set_state(WorkerState::Redundant).await;
                Err(e)
            }
        }
    }

    async fn on_activate(&self) -> Result<ActivationReport, Error> {
        let previous = {
            let mut state = self.state.write().await;
            match *state {
                WorkerState::Installed | WorkerState::Active => {}
                other => return Err(Error::InvalidState(format!("cannot activate from {other:?}"))),
            }
            std::mem::replace(&mut *state, WorkerState::Activating)
        };

        let collected = match self.verify_shell().await {
            Ok(()) => self.collect_garbage().await,
            Err(e) => Err(e),
        };
        match collected {
            Ok(deleted_stores) => {
                self.set_state(WorkerState::Active).await;
                tracing::info!(
                    version = %self.config.stores.version_tag,
                    deleted = deleted_stores.len(),
                    claim_clients = self.config.claim_clients,
                    "worker active"
                );
                Ok(ActivationReport {
                    version_tag: self.config.stores.version_tag.clone(),
                    deleted_stores,
                    claimed_clients: self.config.claim_clients,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "activation failed");
                self.set_state(previous).await;
                Err(e)
            }
        }
    }

    async fn route(&self, request: &Request) -> Intercept {
        if self.state().await != WorkerState::Active {
            return Intercept::PassThrough;
        }

        let class = self.classifier.classify(request);
        tracing::trace!(url = %request.url, ?class, "routing request");
        match class {
            RequestClass::Ignored(IgnoreReason::NonGet) => Intercept::PassThrough,
            RequestClass::Ignored(IgnoreReason::ExcludedHost) => self.network_or_empty(request).await,
            RequestClass::ApiRead => self.network_first_no_stale(request).await,
            RequestClass::Navigation => self.app_shell(request).await,
            RequestClass::StaticAsset => self.cache_first(request).await,
            RequestClass::Other => self.network_then_cache(request).await,
        }
    }

    async fn on_message(&self, message: ClientMessage) -> Result<MessageReply, Error> {
        match message {
            ClientMessage::CheckReminders { reminders, now } => {
                if let Some(reminders) = reminders {
                    self.reminders.lock().await.replace(reminders);
                }
                let notifications = self.check_reminders(now.unwrap_or_else(Utc::now)).await;
                Ok(MessageReply::Notified { notifications })
            }
            ClientMessage::SyncReminders { reminders } => {
                let mut book = self.reminders.lock().await;
                book.replace(reminders);
                Ok(MessageReply::RemindersSynced { count: book.len() })
            }
            ClientMessage::SkipWaiting => {
                tracing::debug!("skip waiting reached a worker outside a registration");
                Ok(MessageReply::Ack)
            }
            ClientMessage::GetVersion => Ok(MessageReply::Version {
                version_tag: self.config.stores.version_tag.clone(),
                state: self.state().await,
                stores: self.storage.store_names().await?,
            }),
            ClientMessage::ClearRuntimeCache => {
                let runtime = &self.config.stores.runtime;
                self.storage.delete_store(runtime).await?;
                self.storage.open_store(runtime).await?;
                tracing::info!(store = %runtime, "runtime cache cleared");
                Ok(MessageReply::RuntimeCacheCleared { store: runtime.clone() })
            }
        }
    }

    async fn on_push(&self, payload: Option<&str>) -> Result<Notification, Error> {
        let payload = PushPayload::parse(payload);
        let notification = Notification {
            title: payload.title.unwrap_or_else(|| self.config.app_name.clone()),
            body: payload.body.unwrap_or_else(|| DEFAULT_PUSH_BODY.to_string()),
            tag: payload.tag,
        };
        self.notifier.show(&notification).await?;
        Ok(notification)
    }

    async fn on_periodic_check(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, Error> {
        if self.state().await != WorkerState::Active {
            return Ok(Vec::new());
        }
        Ok(self.check_reminders(now).await)
    }

    async fn retire(&self) {
        self.set_state(WorkerState::Redundant).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminders::Reminder;
    use crate::request::Destination;
    use crate::worker::testing::{FakeNetwork, RecordingNotifier, SpyStorage};
    use chrono::TimeZone;

    const ORIGIN: &str = "http://localhost:4173";
    const API: &str = "https://87k3cdtkfe.execute-api.eu-central-1.amazonaws.com/dev";

    struct Harness {
        controller: CacheController<SpyStorage, FakeNetwork>,
        storage: SpyStorage,
        network: FakeNetwork,
        notifier: RecordingNotifier,
    }

    fn app_config(tag: &str) -> AppConfig {
        AppConfig {
            version_tag: tag.into(),
            precache_urls: vec!["/".into(), "/offline.html".into(), "/manifest.webmanifest".into()],
            ..Default::default()
        }
    }

    fn url(path: &str) -> String {
        format!("{ORIGIN}{path}")
    }

    fn html(body: &[u8]) -> Response {
        Response::new(200, vec![("content-type".into(), "text/html".into())], body.to_vec())
    }

    fn serve_shell(network: &FakeNetwork) {
        network.serve(&url("/"), html(b"<div id=\"root\"></div>"));
        network.serve(&url("/offline.html"), html(b"<h1>Offline</h1>"));
        network.serve(&url("/manifest.webmanifest"), Response::json(200, &serde_json::json!({"name": "Wahl-Info"})));
    }

    fn build(tag: &str, storage: SpyStorage, network: FakeNetwork) -> Harness {
        let notifier = RecordingNotifier::default();
        let controller =
            CacheController::from_app(&app_config(tag), storage.clone(), network.clone(), Arc::new(notifier.clone()))
                .unwrap();
        Harness { controller, storage, network, notifier }
    }

    async fn harness() -> Harness {
        let network = FakeNetwork::default();
        serve_shell(&network);
        build("v2.0.0", SpyStorage::new().await, network)
    }

    async fn active() -> Harness {
        let h = harness().await;
        h.controller.on_install().await.unwrap();
        h.controller.on_activate().await.unwrap();
        h.storage.clear_ops();
        h
    }

    fn respond(intercept: Intercept) -> Response {
        match intercept {
            Intercept::Respond(response) => response,
            other => panic!("expected a response, got {other:?}"),
        }
    }

    fn api_get(endpoint: &str) -> Request {
        Request::get(&format!("{API}/{endpoint}")).unwrap()
    }

    #[tokio::test]
    async fn test_install_populates_shell_store() {
        let h = harness().await;
        let report = h.controller.on_install().await.unwrap();
        assert_eq!(report.store, "shell-v2.0.0");
        assert_eq!(report.entries, 3);
        assert_eq!(h.controller.state().await, WorkerState::Installed);

        h.controller.on_activate().await.unwrap();
        assert_eq!(h.controller.state().await, WorkerState::Active);

        let keys = h.storage.keys("shell-v2.0.0").await.unwrap();
        let urls: Vec<_> = keys.iter().map(|k| k.url.clone()).collect();
        assert_eq!(urls, vec![url("/"), url("/offline.html"), url("/manifest.webmanifest")]);
    }

    #[tokio::test]
    async fn test_install_fails_on_404() {
        let h = harness().await;
        h.network.serve(&url("/manifest.webmanifest"), Response::empty(404));

        let err = h.controller.on_install().await.unwrap_err();
        assert!(matches!(err, Error::InstallFailed { ref url, .. } if url.ends_with("/manifest.webmanifest")));
        assert_eq!(h.controller.state().await, WorkerState::Redundant);
        assert!(!h.storage.has_store("shell-v2.0.0").await.unwrap());

        assert!(matches!(h.controller.on_activate().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_install_offline_writes_nothing() {
        let h = harness().await;
        h.network.set_offline(true);

        assert!(h.controller.on_install().await.is_err());
        assert!(!h.storage.ops().iter().any(|op| op.starts_with("put")));
    }

    #[tokio::test]
    async fn test_install_twice_rejected() {
        let h = harness().await;
        h.controller.on_install().await.unwrap();
        assert!(matches!(h.controller.on_install().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_not_active_passes_through() {
        let h = harness().await;
        h.controller.on_install().await.unwrap();

        let intercept = h.controller.route(&api_get("parteien")).await;
        assert_eq!(intercept, Intercept::PassThrough);
        assert_eq!(h.network.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_non_get_passes_through_untouched() {
        let h = active().await;
        let calls_before = h.network.calls().len();
        let target = api_get("parteien").url;

        for method in [Method::Post, Method::Put, Method::Delete] {
            let intercept = h.controller.route(&Request::new(method, target.clone())).await;
            assert_eq!(intercept, Intercept::PassThrough);
        }
        assert_eq!(h.network.calls().len(), calls_before);
        assert!(h.storage.ops().is_empty());
    }

    #[tokio::test]
    async fn test_api_online_cached_in_runtime() {
        let h = active().await;
        let body = serde_json::json!([{"id": "p1", "name": "Bürgerliste"}]);
        h.network.serve(&format!("{API}/parteien"), Response::json(200, &body));

        let res = respond(h.controller.route(&api_get("parteien")).await);
        assert_eq!(res, Response::json(200, &body));

        let stored = h.storage.match_in("runtime-v2.0.0", &api_get("parteien").key()).await.unwrap();
        assert_eq!(stored, Some(res));
    }

    #[tokio::test]
    async fn test_api_offline_never_serves_stale() {
        let h = active().await;
        h.network.serve(&format!("{API}/parteien"), Response::json(200, &serde_json::json!([{"id": "p1"}])));
        respond(h.controller.route(&api_get("parteien")).await);

        h.network.set_offline(true);
        h.storage.clear_ops();
        let res = respond(h.controller.route(&api_get("parteien")).await);

        assert_eq!(res.status, 503);
        let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(body["error"], "offline");
        assert!(body["message"].is_string());
        assert!(h.storage.ops().is_empty(), "storage touched: {:?}", h.storage.ops());
    }

    #[tokio::test]
    async fn test_api_error_status_not_cached() {
        let h = active().await;
        h.network.serve(&format!("{API}/kandidaten"), Response::text(500, "boom"));

        let res = respond(h.controller.route(&api_get("kandidaten")).await);
        assert_eq!(res.status, 500);
        assert!(h.storage.match_in("runtime-v2.0.0", &api_get("kandidaten").key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_still_responds() {
        let h = active().await;
        h.network.serve(&format!("{API}/wahllokale"), Response::json(200, &serde_json::json!([])));
        h.storage.fail_writes(true);

        let res = respond(h.controller.route(&api_get("wahllokale")).await);
        assert_eq!(res.status, 200);
        assert_eq!(res.body, b"[]");
    }

    #[tokio::test]
    async fn test_try_store_reports_outcome() {
        let h = active().await;
        let req = api_get("wahltermine");

        let skipped = h.controller.try_store("runtime-v2.0.0", &req, &Response::empty(404)).await.unwrap();
        assert!(!skipped);

        h.storage.fail_writes(true);
        let failed = h.controller.try_store("runtime-v2.0.0", &req, &Response::empty(200)).await;
        assert!(failed.is_err());
    }

    #[tokio::test]
    async fn test_navigation_offline_serves_offline_page() {
        let h = active().await;
        h.network.set_offline(true);

        let res = respond(h.controller.route(&Request::navigate(&url("/wahllokale-karte")).unwrap()).await);
        assert_eq!(res.status, 200);
        assert_eq!(res.body, b"<h1>Offline</h1>");
    }

    #[tokio::test]
    async fn test_navigation_offline_prefers_cached_page() {
        let h = active().await;
        let page = html(b"<p>Favoriten</p>");
        h.network.serve(&url("/favoriten"), page.clone());
        let nav = Request::navigate(&url("/favoriten")).unwrap();
        respond(h.controller.route(&nav).await);

        h.network.set_offline(true);
        assert_eq!(respond(h.controller.route(&nav).await), page);
    }

    #[tokio::test]
    async fn test_navigation_offline_without_offline_page() {
        let h = active().await;
        h.storage.delete_store("shell-v2.0.0").await.unwrap();
        h.network.set_offline(true);

        let res = respond(h.controller.route(&Request::navigate(&url("/kandidaten")).unwrap()).await);
        assert_eq!(res.status, 503);
        assert!(res.header("content-type").is_some_and(|v| v.starts_with("text/plain")));
    }

    #[tokio::test]
    async fn test_navigation_error_status_passed_through() {
        let h = active().await;
        let res = respond(h.controller.route(&Request::navigate(&url("/gibt-es-nicht")).unwrap()).await);
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn test_static_asset_cache_first() {
        let h = active().await;
        let asset = Request::get(&url("/assets/index-4f2a1c.js")).unwrap().with_destination(Destination::Script);
        let script = Response::new(
            200,
            vec![("content-type".into(), "text/javascript".into())],
            b"console.log(1)".to_vec(),
        );
        h.network.serve(&url("/assets/index-4f2a1c.js"), script);

        respond(h.controller.route(&asset).await);
        let calls = h.network.calls().len();
        respond(h.controller.route(&asset).await);
        assert_eq!(h.network.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_static_asset_offline_roundtrip() {
        let h = active().await;
        let stored = Response::new(
            200,
            vec![("content-type".into(), "image/png".into()), ("etag".into(), "\"ab12\"".into())],
            vec![0x89, b'P', b'N', b'G', 0, 0xff],
        );
        h.network.serve(&url("/icons/icon-512x512.png"), stored.clone());
        let req = Request::get(&url("/icons/icon-512x512.png")).unwrap();
        respond(h.controller.route(&req).await);

        h.network.set_offline(true);
        assert_eq!(respond(h.controller.route(&req).await), stored);
    }

    #[tokio::test]
    async fn test_static_asset_offline_miss() {
        let h = active().await;
        h.network.set_offline(true);

        let res = respond(h.controller.route(&Request::get(&url("/assets/app.css")).unwrap()).await);
        assert_eq!(res.status, 503);
        assert!(res.body.is_empty());
    }

    #[tokio::test]
    async fn test_tile_failure_suppressed() {
        let h = active().await;
        h.network.set_offline(true);

        let tile = Request::get("https://b.tile.openstreetmap.org/13/4400/2686.png")
            .unwrap()
            .with_destination(Destination::Image);
        let res = respond(h.controller.route(&tile).await);
        assert_eq!(res.status, 200);
        assert!(res.body.is_empty());
        assert!(h.storage.ops().is_empty());
    }

    #[tokio::test]
    async fn test_other_falls_back_to_any_store() {
        let h = active().await;
        h.network.set_offline(true);

        let root = respond(h.controller.route(&Request::get(&url("/")).unwrap()).await);
        assert_eq!(root.body, b"<div id=\"root\"></div>");

        let missing = h.controller.route(&Request::get(&url("/version.json")).unwrap()).await;
        assert!(matches!(missing, Intercept::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_double_activation_leaves_two_stores() {
        let h = harness().await;
        h.storage.put("shell-v1.0.0", &api_get("parteien").key(), &Response::empty(200)).await.unwrap();
        h.storage.open_store("runtime-v1.0.0").await.unwrap();
        h.storage.open_store("app-cache-v1").await.unwrap();

        h.controller.on_install().await.unwrap();
        let first = h.controller.on_activate().await.unwrap();
        assert_eq!(first.deleted_stores, vec!["shell-v1.0.0", "runtime-v1.0.0", "app-cache-v1"]);
        assert!(first.claimed_clients);

        let second = h.controller.on_activate().await.unwrap();
        assert!(second.deleted_stores.is_empty());

        let mut names = h.storage.store_names().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["runtime-v2.0.0", "shell-v2.0.0"]);
    }

    #[tokio::test]
    async fn test_failed_activation_returns_to_installed() {
        let h = harness().await;
        h.controller.on_install().await.unwrap();
        h.storage.fail_writes(true);

        assert!(h.controller.on_activate().await.is_err());
        assert_eq!(h.controller.state().await, WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_activation_refuses_incomplete_shell() {
        let h = harness().await;
        h.storage.open_store("shell-v1.0.0").await.unwrap();
        h.controller.on_install().await.unwrap();
        h.storage.delete_store("shell-v2.0.0").await.unwrap();
        h.storage.put("shell-v2.0.0", &Request::get(&url("/")).unwrap().key(), &Response::empty(200)).await.unwrap();

        let err = h.controller.on_activate().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(h.controller.state().await, WorkerState::Installed);
        assert!(h.storage.has_store("shell-v1.0.0").await.unwrap());

        h.storage.delete_store("shell-v2.0.0").await.unwrap();
        assert!(matches!(h.controller.on_activate().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_check_reminders_message() {
        let h = active().await;
        let now = Utc.with_ymd_and_hms(2025, 9, 13, 8, 0, 0).unwrap();
        let reminders = vec![
            Reminder {
                id: "t1".into(),
                date_iso: "2025-09-14".into(),
                lead_minutes: 1440,
                title: Some("Kommunalwahl".into()),
            },
            Reminder { id: "t2".into(), date_iso: "2025-10-01".into(), lead_minutes: 60, title: None },
        ];

        let reply = h
            .controller
            .on_message(ClientMessage::CheckReminders { reminders: Some(reminders), now: Some(now) })
            .await
            .unwrap();
        let notifications = match reply {
            MessageReply::Notified { notifications } => notifications,
            other => panic!("unexpected reply: {other:?}"),
        };
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].tag.as_deref(), Some("t1"));
        assert_eq!(h.notifier.shown(), notifications);
    }

    #[tokio::test]
    async fn test_denied_notifications_still_consume_reminders() {
        let h = active().await;
        h.notifier.deny();
        let now = Utc.with_ymd_and_hms(2025, 9, 13, 8, 0, 0).unwrap();
        let reminders = vec![Reminder {
            id: "t1".into(),
            date_iso: "2025-09-14".into(),
            lead_minutes: 1440,
            title: None,
        }];

        let reply = h
            .controller
            .on_message(ClientMessage::CheckReminders { reminders: Some(reminders), now: Some(now) })
            .await
            .unwrap();
        assert!(matches!(reply, MessageReply::Notified { ref notifications } if notifications.len() == 1));
        assert!(h.notifier.shown().is_empty());

        let again = h
            .controller
            .on_message(ClientMessage::CheckReminders { reminders: None, now: Some(now) })
            .await
            .unwrap();
        assert!(matches!(again, MessageReply::Notified { ref notifications } if notifications.is_empty()));
    }

    #[tokio::test]
    async fn test_periodic_check_uses_synced_list() {
        let h = active().await;
        let reminders =
            vec![Reminder { id: "t1".into(), date_iso: "14.09.2025".into(), lead_minutes: 120, title: None }];
        let reply = h.controller.on_message(ClientMessage::SyncReminders { reminders }).await.unwrap();
        assert_eq!(reply, MessageReply::RemindersSynced { count: 1 });

        let early = Utc.with_ymd_and_hms(2025, 9, 13, 12, 0, 0).unwrap();
        assert!(h.controller.on_periodic_check(early).await.unwrap().is_empty());

        let due = Utc.with_ymd_and_hms(2025, 9, 13, 22, 30, 0).unwrap();
        let fired = h.controller.on_periodic_check(due).await.unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].body, "Wahltermin am 14.09.2025");
        assert!(h.controller.on_periodic_check(due).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_version_and_clear_runtime() {
        let h = active().await;
        h.network.serve(&format!("{API}/parteien"), Response::json(200, &serde_json::json!([])));
        respond(h.controller.route(&api_get("parteien")).await);

        let reply = h.controller.on_message(ClientMessage::GetVersion).await.unwrap();
        match reply {
            MessageReply::Version { version_tag, state, stores } => {
                assert_eq!(version_tag, "v2.0.0");
                assert_eq!(state, WorkerState::Active);
                assert_eq!(stores.len(), 2);
            }
            other => panic!("unexpected reply: {other:?}"),
        }

        let reply = h.controller.on_message(ClientMessage::ClearRuntimeCache).await.unwrap();
        assert_eq!(reply, MessageReply::RuntimeCacheCleared { store: "runtime-v2.0.0".into() });
        assert!(h.storage.keys("runtime-v2.0.0").await.unwrap().is_empty());
        assert!(h.storage.has_store("runtime-v2.0.0").await.unwrap());
    }

    #[tokio::test]
    async fn test_push_notification() {
        let h = active().await;

        let shown = h.controller.on_push(Some(r#"{"title":"Wahlamt","body":"Neue Kandidaten"}"#)).await.unwrap();
        assert_eq!(shown.title, "Wahlamt");
        assert_eq!(shown.body, "Neue Kandidaten");

        let fallback = h.controller.on_push(None).await.unwrap();
        assert_eq!(fallback.title, "Wahl-Info");
        assert_eq!(fallback.body, DEFAULT_PUSH_BODY);
        assert_eq!(h.notifier.shown().len(), 2);
    }

    #[tokio::test]
    async fn test_retire_stops_routing() {
        let h = active().await;
        h.controller.retire().await;
        assert_eq!(h.controller.state().await, WorkerState::Redundant);
        assert_eq!(h.controller.route(&Request::get(&url("/")).unwrap()).await, Intercept::PassThrough);
    }
}

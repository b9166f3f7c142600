//! In-memory doubles for controller tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::Network;
use crate::cache::{CacheDb, CacheStorage, StoreInfo};
use crate::reminders::{Notification, Notifier};
use crate::request::{Request, RequestKey, Response};
use crate::Error;

/// Scripted network. Unknown URLs answer 404; offline mode fails everything.
/// While a [`FakeNetwork::hold`] guard is alive, fetches stall after being
/// recorded.
#[derive(Clone, Default)]
pub struct FakeNetwork {
    routes: Arc<Mutex<HashMap<String, Response>>>,
    offline: Arc<AtomicBool>,
    calls: Arc<Mutex<Vec<String>>>,
    gate: Arc<AsyncMutex<()>>,
}

impl FakeNetwork {
    pub fn serve(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn hold(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.gate).lock_owned().await
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());
        drop(self.gate.lock().await);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {url}")));
        }
        Ok(self.routes.lock().unwrap().get(&url).cloned().unwrap_or_else(|| Response::empty(404)))
    }
}

/// Wraps a real in-memory store and records every operation.
#[derive(Clone)]
pub struct SpyStorage {
    inner: CacheDb,
    log: Arc<Mutex<Vec<String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl SpyStorage {
    pub async fn new() -> Self {
        Self {
            inner: CacheDb::open_in_memory().await.unwrap(),
            log: Arc::default(),
            fail_writes: Arc::default(),
        }
    }

    pub fn ops(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_ops(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn record(&self, op: impl Into<String>) {
        self.log.lock().unwrap().push(op.into());
    }

    fn check_write(&self) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::InvalidState("quota exceeded".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for SpyStorage {
    async fn open_store(&self, name: &str) -> Result<(), Error> {
        self.record(format!("open_store {name}"));
        self.check_write()?;
        self.inner.open_store(name).await
    }

    async fn has_store(&self, name: &str) -> Result<bool, Error> {
        self.record(format!("has_store {name}"));
        self.inner.has_store(name).await
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.record("store_names");
        self.inner.store_names().await
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        self.record(format!("delete_store {name}"));
        self.check_write()?;
        self.inner.delete_store(name).await
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.record(format!("put {store} {}", key.url));
        self.check_write()?;
        self.inner.put(store, key, response).await
    }

    async fn put_all(&self, store: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        self.record(format!("put_all {store} {}", entries.len()));
        self.check_write()?;
        self.inner.put_all(store, entries).await
    }

    async fn match_in(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.record(format!("match_in {store} {}", key.url));
        self.inner.match_in(store, key).await
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.record(format!("match_any {}", key.url));
        self.inner.match_any(key).await
    }

    async fn keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        self.record(format!("keys {store}"));
        self.inner.keys(store).await
    }

    async fn store_infos(&self) -> Result<Vec<StoreInfo>, Error> {
        self.record("store_infos");
        self.inner.store_infos().await
    }
}

/// Collects shown notifications. `deny` makes every `show` fail.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    shown: Arc<Mutex<Vec<Notification>>>,
    denied: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }

    pub fn deny(&self) {
        self.denied.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn show(&self, notification: &Notification) -> Result<(), Error> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(Error::NotifyFailed("permission denied".into()));
        }
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

//! Notification sink for the stdio host.
//!
//! There is no screen to draw on, so notifications become structured log
//! records on stderr.

use async_trait::async_trait;
use wahlinfo_core::Error;
use wahlinfo_core::reminders::{Notification, Notifier};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn show(&self, notification: &Notification) -> Result<(), Error> {
        tracing::info!(
            title = %notification.title,
            body = %notification.body,
            tag = ?notification.tag,
            "notification"
        );
        Ok(())
    }
}

//! Election date reminders and user-visible notifications.
//!
//! The application owns the reminder list (it lives in browser storage); the
//! worker only receives a copy over the message channel and decides which
//! entries are due. Delivery is best-effort: a missed wake-up skips a cycle.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Lead time used when an entry does not specify one (one day).
pub const DEFAULT_LEAD_MINUTES: i64 = 1440;

fn default_lead_minutes() -> i64 {
    DEFAULT_LEAD_MINUTES
}

/// A reminder registered by the user for an election date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Reminder {
    pub id: String,
    /// `YYYY-MM-DD`, `YYYY/MM/DD`, `DD.MM.YYYY` or RFC 3339.
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    #[serde(rename = "leadMinutes", default = "default_lead_minutes")]
    pub lead_minutes: i64,
    #[serde(default)]
    pub title: Option<String>,
}

/// A user-visible alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Collapses repeated notifications for the same reminder.
    pub tag: Option<String>,
}

/// Delivers notifications to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: &Notification) -> Result<(), Error>;
}

/// Parse the date formats the application stores. Date-only values mean
/// midnight UTC.
pub fn parse_reminder_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Reminder list plus the ids this worker generation already notified.
#[derive(Debug, Default)]
pub struct ReminderBook {
    entries: Vec<Reminder>,
    notified: HashSet<String>,
}

impl ReminderBook {
    /// Replace the reminder list. Ids that disappeared are forgotten, so
    /// re-adding one later notifies again.
    pub fn replace(&mut self, entries: Vec<Reminder>) {
        let ids: HashSet<&str> = entries.iter().map(|r| r.id.as_str()).collect();
        self.notified.retain(|id| ids.contains(id.as_str()));
        self.entries = entries;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose lead time has elapsed but whose date has not passed yet.
    /// Each id is returned once per worker generation.
    pub fn take_due(&mut self, now: DateTime<Utc>, app_name: &str) -> Vec<Notification> {
        let mut due = Vec::new();
        for reminder in &self.entries {
            if self.notified.contains(&reminder.id) {
                continue;
            }
            let Some(date) = parse_reminder_date(&reminder.date_iso) else {
                tracing::warn!(id = %reminder.id, date = %reminder.date_iso, "skipping reminder with unparseable date");
                continue;
            };
            let Some(fire_at) =
                Duration::try_minutes(reminder.lead_minutes.max(0)).and_then(|lead| date.checked_sub_signed(lead))
            else {
                tracing::warn!(
                    id = %reminder.id,
                    lead_minutes = reminder.lead_minutes,
                    "skipping reminder with out-of-range lead time"
                );
                continue;
            };
            if fire_at <= now && now < date {
                due.push(Notification {
                    title: app_name.to_string(),
                    body: format!(
                        "{} am {}",
                        reminder.title.as_deref().unwrap_or("Wahltermin"),
                        date.format("%d.%m.%Y")
                    ),
                    tag: Some(reminder.id.clone()),
                });
            }
        }
        for notification in &due {
            if let Some(tag) = &notification.tag {
                self.notified.insert(tag.clone());
            }
        }
        due
    }
}

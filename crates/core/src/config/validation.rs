//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version_tag` is empty or contains whitespace
    /// - the store prefixes are empty or identical
    /// - `app_origin` is not an http(s) URL
    /// - `precache_urls` does not contain `offline_page`
    /// - `api_endpoints` is empty
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `reminder_interval_secs` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version_tag.is_empty() {
            return Err(invalid("version_tag", "must not be empty"));
        }
        if self.version_tag.chars().any(char::is_whitespace) {
            return Err(invalid("version_tag", "must not contain whitespace"));
        }

        if self.shell_store_prefix.is_empty() || self.runtime_store_prefix.is_empty() {
            return Err(invalid("store_prefix", "must not be empty"));
        }
        if self.shell_store_prefix == self.runtime_store_prefix {
            return Err(invalid("runtime_store_prefix", "must differ from shell_store_prefix"));
        }

        match url::Url::parse(&self.app_origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => {}
            Ok(_) => return Err(invalid("app_origin", "must use http or https")),
            Err(e) => return Err(invalid("app_origin", &e.to_string())),
        }

        if !self.precache_urls.contains(&self.offline_page) {
            return Err(invalid("precache_urls", "must contain offline_page"));
        }

        if self.api_endpoints.is_empty() {
            return Err(invalid("api_endpoints", "must not be empty"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.reminder_interval_secs == 0 {
            return Err(invalid("reminder_interval_secs", "must be greater than 0"));
        }

        if self.skip_waiting && !self.claim_clients {
            tracing::warn!(
                "skip_waiting is set without claim_clients; \
                 open clients keep the old worker until they reload"
            );
        }

        Ok(())
    }
}

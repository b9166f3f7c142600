//! Core of the Wahl-Info offline cache controller.
//!
//! This crate provides:
//! - Named, version-tagged cache stores on SQLite
//! - The request classifier and per-class caching strategies
//! - Worker lifecycle (install, activate, supersede) and registration
//! - Reminder checks and notifications
//! - Unified error types and layered configuration
//!
//! The network is injected through [`worker::Network`]; this crate has no HTTP
//! client of its own.

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod reminders;
pub mod request;
pub mod worker;

pub use cache::{CacheDb, CacheStorage};
pub use config::AppConfig;
pub use error::Error;

//! SQLite-backed named cache stores.
//!
//! Each store is a request-keyed set of response snapshots. Stores are cheap
//! to create and are deleted wholesale when a new worker version supersedes
//! them; there is no per-entry expiry.
//!
//! - Request-addressed keys using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::{CacheStorage, StoreInfo};

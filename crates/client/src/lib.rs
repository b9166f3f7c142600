//! Network adapter for the Wahl-Info offline cache controller.
//!
//! Implements [`wahlinfo_core::worker::Network`] on reqwest so the server can
//! put the controller in front of the real API.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig};

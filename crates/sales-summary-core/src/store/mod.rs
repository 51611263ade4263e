//! Result storage abstraction for Sales Summary.
//!
//! The [`ResultStore`] trait is the persistence facade the upload pipeline
//! and HTTP handlers are written against. Handles are constructed
//! explicitly and passed in, so tests can swap the on-disk store for the
//! [`memory::InMemoryStore`] double.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

/// Path prefix under which stored results are served.
pub const RESULTS_ROUTE_PREFIX: &str = "/results";

/// Build the relative download link for a result ID.
pub fn results_link(id: &str) -> String {
    format!("{}/{}", RESULTS_ROUTE_PREFIX, id)
}

/// Key-value store for aggregated summary files.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`save`](ResultStore::save) | Write (or overwrite) a result |
/// | [`exists`](ResultStore::exists) | Check whether a result is stored |
/// | [`get`](ResultStore::get) | Read a full result back |
/// | [`download_link`](ResultStore::download_link) | Relative URL for clients |
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist `content` under `id`, replacing any existing value.
    ///
    /// Returns a human-readable location for the stored result
    /// (a filesystem path for on-disk stores).
    async fn save(&self, id: &str, content: &str) -> Result<String>;

    /// Whether a result is stored under `id`.
    async fn exists(&self, id: &str) -> Result<bool>;

    /// Read the full content stored under `id`, or `None` if absent.
    async fn get(&self, id: &str) -> Result<Option<String>>;

    /// Relative path a client uses to fetch the result later.
    fn download_link(&self, id: &str) -> String {
        results_link(id)
    }
}

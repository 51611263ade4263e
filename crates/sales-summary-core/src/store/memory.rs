//! In-memory [`ResultStore`] implementation for testing.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Nothing is persisted.
//! A poisoned lock is recovered: every write is a single `insert`, so the
//! map is never left half-updated.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use async_trait::async_trait;

use super::ResultStore;

/// In-memory result store.
pub struct InMemoryStore {
    results: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            results: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.results.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.results.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for InMemoryStore {
    async fn save(&self, id: &str, content: &str) -> Result<String> {
        let mut results = self.write();
        results.insert(id.to_string(), content.to_string());
        Ok(format!("memory://{}", id))
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let results = self.read();
        Ok(results.contains_key(id))
    }

    async fn get(&self, id: &str) -> Result<Option<String>> {
        let results = self.read();
        Ok(results.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_get_exists() {
        let store = InMemoryStore::new();
        assert!(!store.exists("a.csv").await.unwrap());
        assert_eq!(store.get("a.csv").await.unwrap(), None);

        store.save("a.csv", "x,1\n").await.unwrap();
        assert!(store.exists("a.csv").await.unwrap());
        assert_eq!(store.get("a.csv").await.unwrap().as_deref(), Some("x,1\n"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = InMemoryStore::new();
        store.save("a.csv", "first").await.unwrap();
        store.save("a.csv", "second").await.unwrap();
        assert_eq!(store.get("a.csv").await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_recovered() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        store.save("a.csv", "x,1\n").await.unwrap();

        let poisoner = store.clone();
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.results.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(store.results.is_poisoned());

        assert_eq!(store.len(), 1);
        assert!(store.exists("a.csv").await.unwrap());
        assert_eq!(store.get("a.csv").await.unwrap().as_deref(), Some("x,1\n"));
        store.save("b.csv", "y,2\n").await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_download_link() {
        let store = InMemoryStore::new();
        assert_eq!(store.download_link("summary_1.csv"), "/results/summary_1.csv");
    }
}

// In-memory cache storage.
// Used when embedding the agent without a disk and throughout the test suite.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Method;

use crate::error::Result;
use crate::platform::{Cache, CacheStorage, Request, Response};

/// Ordered set of in-memory caches. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStorage {
    caches: Arc<RwLock<Vec<MemoryCache>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    type Cache = MemoryCache;

    async fn open(&self, name: &str) -> Result<MemoryCache> {
        let mut caches = self.caches.write();
        if let Some(cache) = caches.iter().find(|c| c.name == name) {
            return Ok(cache.clone());
        }

        let cache = MemoryCache::new(name);
        caches.push(cache.clone());
        Ok(cache)
    }

    async fn get(&self, name: &str) -> Result<Option<MemoryCache>> {
        Ok(self.caches.read().iter().find(|c| c.name == name).cloned())
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.caches.read().iter().any(|c| c.name == name))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut caches = self.caches.write();
        let before = caches.len();
        caches.retain(|c| c.name != name);
        Ok(caches.len() != before)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.caches.read().iter().map(|c| c.name.clone()).collect())
    }
}

/// A single in-memory cache generation.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    name: String,
    entries: Arc<RwLock<Vec<(String, Response)>>>,
}

impl MemoryCache {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>> {
        if request.method != Method::GET {
            return Ok(None);
        }

        let key = request.cache_key();
        Ok(self
            .entries
            .read()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, response)| response.clone()))
    }

    async fn put(&self, request: &Request, response: Response) -> Result<()> {
        let key = request.cache_key();
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = response,
            None => entries.push((key, response)),
        }
        Ok(())
    }

    async fn delete(&self, request: &Request) -> Result<bool> {
        let key = request.cache_key();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(k, _)| *k != key);
        Ok(entries.len() != before)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().iter().map(|(k, _)| k.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_is_idempotent_and_shared() {
        let storage = MemoryCacheStorage::new();
        let a = storage.open("v1").await.unwrap();
        let b = storage.open("v1").await.unwrap();

        let request = Request::get("http://localhost:8080/");
        a.put(&request, Response::new(&request.url, 200, "root"))
            .await
            .unwrap();

        assert_eq!(b.len(), 1);
        assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
    }

    #[tokio::test]
    async fn test_storage_match_searches_in_creation_order() {
        let storage = MemoryCacheStorage::new();
        let old = storage.open("v0").await.unwrap();
        let new = storage.open("v1").await.unwrap();

        let request = Request::get("http://localhost:8080/");
        new.put(&request, Response::new(&request.url, 200, "new"))
            .await
            .unwrap();
        old.put(&request, Response::new(&request.url, 200, "old"))
            .await
            .unwrap();

        let hit = storage.match_request(&request).await.unwrap().unwrap();
        assert_eq!(hit.text(), "old");

        storage.delete("v0").await.unwrap();
        let hit = storage.match_request(&request).await.unwrap().unwrap();
        assert_eq!(hit.text(), "new");
    }

    #[tokio::test]
    async fn test_match_ignores_fragment_and_non_get() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let request = Request::get("http://localhost:8080/index.html");
        cache
            .put(&request, Response::new(&request.url, 200, "page"))
            .await
            .unwrap();

        let with_fragment = Request::get("http://localhost:8080/index.html#top");
        assert!(cache.match_request(&with_fragment).await.unwrap().is_some());

        let put = Request::get("http://localhost:8080/index.html").with_method(Method::PUT);
        assert!(cache.match_request(&put).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_cache() {
        let storage = MemoryCacheStorage::new();
        assert!(!storage.delete("missing").await.unwrap());
        assert!(!storage.has("missing").await.unwrap());
    }

    /// Storage whose listing races with an activation deleting `evict`.
    struct RacingStorage {
        inner: MemoryCacheStorage,
        evict: &'static str,
    }

    #[async_trait]
    impl CacheStorage for RacingStorage {
        type Cache = MemoryCache;

        async fn open(&self, name: &str) -> Result<MemoryCache> {
            self.inner.open(name).await
        }

        async fn get(&self, name: &str) -> Result<Option<MemoryCache>> {
            self.inner.get(name).await
        }

        async fn has(&self, name: &str) -> Result<bool> {
            self.inner.has(name).await
        }

        async fn delete(&self, name: &str) -> Result<bool> {
            self.inner.delete(name).await
        }

        async fn keys(&self) -> Result<Vec<String>> {
            let names = self.inner.keys().await?;
            self.inner.delete(self.evict).await?;
            Ok(names)
        }
    }

    #[tokio::test]
    async fn test_storage_match_never_recreates_deleted_cache() {
        let inner = MemoryCacheStorage::new();
        inner.open("nabs-radio-v0").await.unwrap();
        let current = inner.open("nabs-radio-v1").await.unwrap();
        let request = Request::get("http://localhost:8080/");
        current
            .put(&request, Response::new(&request.url, 200, "root"))
            .await
            .unwrap();

        let storage = RacingStorage {
            inner: inner.clone(),
            evict: "nabs-radio-v0",
        };
        let hit = storage.match_request(&request).await.unwrap().unwrap();

        assert_eq!(hit.text(), "root");
        assert_eq!(inner.keys().await.unwrap(), vec!["nabs-radio-v1"]);
    }

    #[tokio::test]
    async fn test_get_does_not_create() {
        let storage = MemoryCacheStorage::new();
        assert!(storage.get("v1").await.unwrap().is_none());
        assert!(storage.keys().await.unwrap().is_empty());
    }
}

// Filesystem-backed cache storage.
// Each generation is a directory; entries are JSON metadata plus a raw body file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::Method;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{AgentError, Result};
use crate::platform::{Cache, CacheStorage, Request, Response};

use super::paths;

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }
}

/// Read cached JSON data from a file.
pub fn read_cached<T: DeserializeOwned>(path: &Path) -> Result<Option<CachedData<T>>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let cached: CachedData<T> = serde_json::from_str(&contents)?;
    Ok(Some(cached))
}

/// Write data to cache as JSON.
pub fn write_cached<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let cached = CachedData::new(data);
    let json = serde_json::to_string_pretty(&cached)?;
    write_bytes(path, json.as_bytes())
}

/// Write raw bytes atomically via a temp file.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Read raw bytes, returning None if the file is missing.
pub fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(fs::read(path)?))
}

/// Delete a cached file.
pub fn delete(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Delete a cached directory and all contents.
pub fn delete_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

fn read_index(path: &Path) -> Result<Vec<String>> {
    Ok(read_cached::<Vec<String>>(path)?
        .map(|cached| cached.data)
        .unwrap_or_default())
}

/// Metadata stored beside each cached body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    response: Response,
}

/// Run filesystem work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AgentError::Other(format!("cache task failed: {}", e)))?
}

/// Cache storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct DiskCacheStorage {
    root: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl DiskCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Storage under the platform cache directory.
    pub fn in_default_location() -> Option<Self> {
        paths::cache_dir().map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn handle(&self, name: &str) -> DiskCache {
        DiskCache {
            name: name.to_string(),
            root: self.root.clone(),
            dir: paths::generation_dir(&self.root, name),
            lock: Arc::clone(&self.lock),
        }
    }

    fn open_sync(&self, name: &str) -> Result<DiskCache> {
        let _guard = self.lock.lock();
        let index_path = paths::index_path(&self.root);
        let mut names = read_index(&index_path)?;
        let cache = self.handle(name);

        if !names.iter().any(|n| n == name) {
            tracing::debug!(cache = name, dir = %cache.dir.display(), "Creating cache");
            fs::create_dir_all(&cache.dir)?;
            names.push(name.to_string());
            write_cached(&index_path, &names)?;
        }

        Ok(cache)
    }

    fn get_sync(&self, name: &str) -> Result<Option<DiskCache>> {
        let _guard = self.lock.lock();
        let exists = read_index(&paths::index_path(&self.root))?
            .iter()
            .any(|n| n == name);
        Ok(exists.then(|| self.handle(name)))
    }

    fn delete_sync(&self, name: &str) -> Result<bool> {
        let _guard = self.lock.lock();
        let index_path = paths::index_path(&self.root);
        let mut names = read_index(&index_path)?;
        let before = names.len();
        names.retain(|n| n != name);
        if names.len() == before {
            return Ok(false);
        }

        write_cached(&index_path, &names)?;
        delete_dir(&paths::generation_dir(&self.root, name))?;
        Ok(true)
    }

    fn keys_sync(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock();
        read_index(&paths::index_path(&self.root))
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    type Cache = DiskCache;

    async fn open(&self, name: &str) -> Result<DiskCache> {
        let this = self.clone();
        let name = name.to_string();
        blocking(move || this.open_sync(&name)).await
    }

    async fn get(&self, name: &str) -> Result<Option<DiskCache>> {
        let this = self.clone();
        let name = name.to_string();
        blocking(move || this.get_sync(&name)).await
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.get(name).await?.is_some())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let this = self.clone();
        let name = name.to_string();
        blocking(move || this.delete_sync(&name)).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let this = self.clone();
        blocking(move || this.keys_sync()).await
    }
}

/// Handle to one generation directory.
#[derive(Debug, Clone)]
pub struct DiskCache {
    name: String,
    root: PathBuf,
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl DiskCache {
    /// When an entry was last written.
    pub fn cached_at(&self, request: &Request) -> Result<Option<DateTime<Utc>>> {
        let meta = paths::entry_meta_path(&self.dir, &request.cache_key());
        Ok(read_cached::<StoredEntry>(&meta)?.map(|cached| cached.cached_at))
    }

    /// Whether this generation is still listed in the storage index.
    /// Caller must hold the lock.
    fn is_live(&self) -> Result<bool> {
        Ok(read_index(&paths::index_path(&self.root))?
            .iter()
            .any(|n| *n == self.name))
    }

    fn match_sync(&self, key: &str) -> Result<Option<Response>> {
        let _guard = self.lock.lock();
        let Some(cached) = read_cached::<StoredEntry>(&paths::entry_meta_path(&self.dir, key))?
        else {
            return Ok(None);
        };

        let mut response = cached.data.response;
        response.body = read_bytes(&paths::entry_body_path(&self.dir, key))?.unwrap_or_default();
        Ok(Some(response))
    }

    fn put_sync(&self, key: String, response: Response) -> Result<()> {
        let _guard = self.lock.lock();

        // A handle can outlive its generation; writing would resurrect the directory
        if !self.is_live()? {
            return Err(AgentError::CacheNotFound(self.name.clone()));
        }

        // Body first so a visible entry always has its bytes on disk
        write_bytes(&paths::entry_body_path(&self.dir, &key), &response.body)?;
        let entry = StoredEntry {
            key: key.clone(),
            response,
        };
        write_cached(&paths::entry_meta_path(&self.dir, &key), &entry)?;

        let index_path = paths::entries_index_path(&self.dir);
        let mut keys = read_index(&index_path)?;
        if !keys.contains(&key) {
            keys.push(key);
            write_cached(&index_path, &keys)?;
        }
        Ok(())
    }

    fn delete_sync(&self, key: &str) -> Result<bool> {
        let _guard = self.lock.lock();
        let index_path = paths::entries_index_path(&self.dir);
        let mut keys = read_index(&index_path)?;
        let before = keys.len();
        keys.retain(|k| k != key);
        if keys.len() == before {
            return Ok(false);
        }

        write_cached(&index_path, &keys)?;
        delete(&paths::entry_meta_path(&self.dir, key))?;
        delete(&paths::entry_body_path(&self.dir, key))?;
        Ok(true)
    }

    fn keys_sync(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock();
        read_index(&paths::entries_index_path(&self.dir))
    }
}

#[async_trait]
impl Cache for DiskCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>> {
        if request.method != Method::GET {
            return Ok(None);
        }

        let this = self.clone();
        let key = request.cache_key();
        blocking(move || this.match_sync(&key)).await
    }

    async fn put(&self, request: &Request, response: Response) -> Result<()> {
        let this = self.clone();
        let key = request.cache_key();
        blocking(move || this.put_sync(key, response)).await
    }

    async fn delete(&self, request: &Request) -> Result<bool> {
        let this = self.clone();
        let key = request.cache_key();
        blocking(move || this.delete_sync(&key)).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let this = self.clone();
        blocking(move || this.keys_sync()).await
    }
}

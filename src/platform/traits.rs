//! Collaborator traits for the host platform.
//!
//! The agent never owns cache storage, the network stack, or the window
//! and notification services. Each is reached through one of these traits so
//! hosts (and tests) can supply their own.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

use super::types::{Notification, NotificationOptions, Request, Response};

/// A single named cache generation.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Name this cache was opened under.
    fn name(&self) -> &str;

    /// Look up a stored response. Only GET requests ever match.
    async fn match_request(&self, request: &Request) -> Result<Option<Response>>;

    /// Store a response, replacing any previous entry for the same key.
    async fn put(&self, request: &Request, response: Response) -> Result<()>;

    /// Remove an entry. Returns true if one existed.
    async fn delete(&self, request: &Request) -> Result<bool>;

    /// Keys of all stored entries in insertion order.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// The set of named caches owned by the host.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    type Cache: Cache + Clone + 'static;

    /// Open a cache, creating it if absent.
    async fn open(&self, name: &str) -> Result<Self::Cache>;

    /// Look up an existing cache without creating it.
    async fn get(&self, name: &str) -> Result<Option<Self::Cache>>;

    async fn has(&self, name: &str) -> Result<bool>;

    /// Delete a cache and all of its entries. Returns true if it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Names of all caches in creation order.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Search every cache in creation order and return the first hit.
    /// Caches deleted while the search runs are skipped, never recreated.
    async fn match_request(&self, request: &Request) -> Result<Option<Response>> {
        for name in self.keys().await? {
            let Some(cache) = self.get(&name).await? else {
                continue;
            };
            if let Some(response) = cache.match_request(request).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

/// The host's network stack.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a request. HTTP error statuses are returned as responses;
    /// only transport failures are errors.
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Lifecycle, window, and notification services of the host.
#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Activate the new agent without waiting for old instances to release.
    async fn skip_waiting(&self) -> Result<()>;

    /// Take control of pages that are already open.
    async fn claim_clients(&self) -> Result<()>;

    /// Open or focus a window on the given URL.
    async fn open_window(&self, url: &str) -> Result<()>;

    async fn show_notification(&self, title: &str, options: NotificationOptions) -> Result<()>;

    async fn close_notification(&self, notification: &Notification) -> Result<()>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<T: WorkerHost + ?Sized> WorkerHost for Arc<T> {
    async fn skip_waiting(&self) -> Result<()> {
        (**self).skip_waiting().await
    }

    async fn claim_clients(&self) -> Result<()> {
        (**self).claim_clients().await
    }

    async fn open_window(&self, url: &str) -> Result<()> {
        (**self).open_window(url).await
    }

    async fn show_notification(&self, title: &str, options: NotificationOptions) -> Result<()> {
        (**self).show_notification(title, options).await
    }

    async fn close_notification(&self, notification: &Notification) -> Result<()> {
        (**self).close_notification(notification).await
    }
}

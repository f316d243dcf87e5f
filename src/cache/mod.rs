// Cache module.
// Storage backends plus the fetch-and-store helpers used for precaching.

pub mod memory;
pub mod paths;
pub mod store;

use futures::future::try_join_all;

use crate::error::{AgentError, Result};
use crate::platform::{Cache, Fetcher, Request, Response};

pub use memory::{MemoryCache, MemoryCacheStorage};
pub use store::{CachedData, DiskCache, DiskCacheStorage};

/// Fetch a request and require a 2xx response.
async fn fetch_ok<F: Fetcher + ?Sized>(fetcher: &F, request: &Request) -> Result<Response> {
    let response = fetcher.fetch(request).await?;
    if !response.ok() {
        return Err(AgentError::BadStatus {
            url: request.url.clone(),
            status: response.status,
        });
    }
    Ok(response)
}

/// Fetch one request and store the response.
pub async fn add<C, F>(cache: &C, fetcher: &F, request: &Request) -> Result<()>
where
    C: Cache + ?Sized,
    F: Fetcher + ?Sized,
{
    let response = fetch_ok(fetcher, request).await?;
    cache.put(request, response).await
}

/// Fetch every request concurrently and store them only if all succeed.
///
/// A single failed fetch or non-2xx status aborts the whole batch and leaves
/// the cache untouched.
pub async fn add_all<C, F>(cache: &C, fetcher: &F, requests: &[Request]) -> Result<()>
where
    C: Cache + ?Sized,
    F: Fetcher + ?Sized,
{
    let fetches = requests.iter().map(|request| async move {
        fetch_ok(fetcher, request)
            .await
            .map_err(|e| AgentError::Install {
                url: request.url.clone(),
                reason: e.to_string(),
            })
    });
    let responses = try_join_all(fetches).await?;

    for (request, response) in requests.iter().zip(responses) {
        cache.put(request, response).await?;
    }
    Ok(())
}

// Shared helpers for integration tests.
// A canned-response fetcher that counts every network call.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use offline_shell::platform::{Fetcher, Request, Response};
use offline_shell::{AgentError, Result};

/// Fetcher returning canned responses. Unknown URLs fail like a dropped
/// connection.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: HashMap<String, (u16, Vec<u8>)>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .insert(Request::get(url).cache_key(), (status, body.into()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.offline.load(Ordering::SeqCst) {
            return Err(AgentError::Other(format!(
                "network unreachable: {}",
                request.url
            )));
        }

        match self.responses.get(&request.cache_key()) {
            Some((status, body)) => Ok(Response::new(request.url.clone(), *status, body.clone())),
            None => Err(AgentError::Other(format!(
                "connection refused: {}",
                request.url
            ))),
        }
    }
}

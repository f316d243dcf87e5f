// Event dispatch through the host adapter, including failing collaborators.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use offline_shell::cache::{MemoryCache, MemoryCacheStorage};
use offline_shell::host::HeadlessHost;
use offline_shell::platform::{
    CacheStorage, Notification, NotificationOptions, PushMessage, Request, Response, WorkerHost,
};
use offline_shell::{
    AgentConfig, AgentError, AgentEvent, CacheAgent, EventOutcome, FetchOutcome, Result, dispatch,
};

use common::MockFetcher;

/// Host whose notification service is unavailable.
struct NoNotifications;

#[async_trait]
impl WorkerHost for NoNotifications {
    async fn skip_waiting(&self) -> Result<()> {
        Ok(())
    }

    async fn claim_clients(&self) -> Result<()> {
        Ok(())
    }

    async fn open_window(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn show_notification(&self, _title: &str, _options: NotificationOptions) -> Result<()> {
        Err(AgentError::Host("notification permission denied".to_string()))
    }

    async fn close_notification(&self, _notification: &Notification) -> Result<()> {
        Err(AgentError::Host("notification already gone".to_string()))
    }
}

/// Storage whose lookups fail for everything except the root document.
#[derive(Clone)]
struct FailingLookups {
    inner: MemoryCacheStorage,
}

#[async_trait]
impl CacheStorage for FailingLookups {
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
        self.inner.keys().await
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>> {
        if request.url == "http://localhost:8080/" {
            return self.inner.match_request(request).await;
        }
        Err(AgentError::Io(std::io::Error::other("cache index unreadable")))
    }
}

fn small_config() -> AgentConfig {
    AgentConfig {
        assets: vec!["/".to_string()],
        ..AgentConfig::default()
    }
}

#[tokio::test]
async fn full_lifecycle_through_dispatch() {
    let fetcher = Arc::new(MockFetcher::new().with_response(
        "http://localhost:8080/",
        200,
        "<html>root</html>",
    ));
    let host = Arc::new(HeadlessHost::new());
    let storage = MemoryCacheStorage::new();
    storage.open("nabs-radio-v0").await.unwrap();
    let agent = CacheAgent::new(
        small_config(),
        storage.clone(),
        Arc::clone(&fetcher),
        Arc::clone(&host),
    );

    assert!(matches!(
        dispatch(&agent, AgentEvent::Install).await,
        EventOutcome::Completed
    ));
    assert!(host.skipped_waiting());

    match dispatch(&agent, AgentEvent::Activate).await {
        EventOutcome::Activated(deleted) => assert_eq!(deleted, vec!["nabs-radio-v0"]),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(host.claimed_clients());

    let outcome = dispatch(
        &agent,
        AgentEvent::Fetch(Request::navigate("http://localhost:8080/")),
    )
    .await;
    match outcome {
        EventOutcome::Fetch(FetchOutcome::Respond(response)) => {
            assert_eq!(response.text(), "<html>root</html>")
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    // Install fetched the root once; the navigation was served from cache
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn failed_install_is_reported_not_fatal() {
    let agent = CacheAgent::new(
        small_config(),
        MemoryCacheStorage::new(),
        MockFetcher::new(),
        HeadlessHost::new(),
    );

    let outcome = dispatch(&agent, AgentEvent::Install).await;
    assert!(matches!(
        outcome,
        EventOutcome::Failed(AgentError::Install { .. })
    ));
    assert!(!agent.host().skipped_waiting());

    // The agent keeps serving afterwards
    let outcome = dispatch(
        &agent,
        AgentEvent::Sync {
            tag: "sync-requests".to_string(),
        },
    )
    .await;
    assert!(matches!(outcome, EventOutcome::Completed));
}

#[tokio::test]
async fn notification_failures_degrade_gracefully() {
    let agent = CacheAgent::new(
        small_config(),
        MemoryCacheStorage::new(),
        MockFetcher::new(),
        NoNotifications,
    );

    let outcome = dispatch(&agent, AgentEvent::Push(PushMessage::text("Live now!"))).await;
    assert!(matches!(outcome, EventOutcome::Failed(AgentError::Host(_))));

    // A failed dismissal still lets the play action open the app
    let click = offline_shell::platform::NotificationClick {
        notification: Notification {
            title: "NABS Radio".to_string(),
            options: agent.notification_options(&PushMessage::empty()),
        },
        action: "play".to_string(),
    };
    let outcome = dispatch(&agent, AgentEvent::NotificationClick(click)).await;
    assert!(matches!(outcome, EventOutcome::Completed));
}

#[tokio::test]
async fn concurrent_intercepts_share_the_cache() {
    let fetcher = Arc::new(MockFetcher::new().with_response(
        "http://localhost:8080/",
        200,
        "<html>root</html>",
    ));
    let agent = Arc::new(CacheAgent::new(
        small_config(),
        MemoryCacheStorage::new(),
        Arc::clone(&fetcher),
        HeadlessHost::new(),
    ));
    dispatch(agent.as_ref(), AgentEvent::Install).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let agent = Arc::clone(&agent);
            tokio::spawn(async move {
                dispatch(
                    agent.as_ref(),
                    AgentEvent::Fetch(Request::get("http://localhost:8080/")),
                )
                .await
            })
        })
        .collect();

    for handle in handles {
        let outcome = handle.await.unwrap();
        assert!(matches!(
            outcome,
            EventOutcome::Fetch(FetchOutcome::Respond(_))
        ));
    }
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn cache_lookup_errors_fall_back_or_surface() {
    let fetcher = Arc::new(MockFetcher::new().with_response(
        "http://localhost:8080/",
        200,
        "<html>root</html>",
    ));
    let agent = CacheAgent::new(
        small_config(),
        FailingLookups {
            inner: MemoryCacheStorage::new(),
        },
        Arc::clone(&fetcher),
        HeadlessHost::new(),
    );
    dispatch(&agent, AgentEvent::Install).await;
    assert_eq!(fetcher.calls(), 1);

    // Navigation: the failed lookup is treated like an offline miss
    let outcome = dispatch(
        &agent,
        AgentEvent::Fetch(Request::navigate("http://localhost:8080/schedule")),
    )
    .await;
    match outcome {
        EventOutcome::Fetch(FetchOutcome::Respond(response)) => {
            assert_eq!(response.text(), "<html>root</html>")
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // Subresource: the storage error reaches the caller
    let outcome = dispatch(
        &agent,
        AgentEvent::Fetch(Request::get("http://localhost:8080/now-playing.json")),
    )
    .await;
    assert!(matches!(outcome, EventOutcome::Failed(AgentError::Io(_))));

    // A failed lookup never falls through to the network
    assert_eq!(fetcher.calls(), 1);
}

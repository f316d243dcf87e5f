// Cache fallback agent.
// Precaches the shell on install, evicts old generations on activate, and answers
// intercepted requests cache-first with network and root-document fallbacks.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;

use crate::cache;
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::events::{EventHandler, FetchOutcome};
use crate::platform::{
    CacheStorage, Fetcher, NotificationClick, NotificationData, NotificationOptions, PushMessage,
    Request, Response, WorkerHost,
};

/// Action token that opens the app from a notification.
pub const PLAY_ACTION: &str = "play";

/// The offline agent, generic over its host collaborators.
pub struct CacheAgent<S, F, H> {
    config: AgentConfig,
    storage: S,
    fetcher: F,
    host: H,
}

impl<S, F, H> CacheAgent<S, F, H>
where
    S: CacheStorage,
    F: Fetcher,
    H: WorkerHost,
{
    pub fn new(config: AgentConfig, storage: S, fetcher: F, host: H) -> Self {
        Self {
            config,
            storage,
            fetcher,
            host,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Name of the current cache generation.
    pub fn cache_name(&self) -> String {
        self.config.cache_name()
    }

    /// Requests for every configured asset, resolved against the origin.
    pub fn precache_requests(&self) -> Result<Vec<Request>> {
        self.config
            .assets
            .iter()
            .map(|asset| Ok(Request::get(self.config.resolve(asset)?.to_string())))
            .collect()
    }

    fn fallback_request(&self) -> Result<Request> {
        Ok(Request::get(
            self.config.resolve(&self.config.fallback_document)?.to_string(),
        ))
    }

    /// Resolve a possibly relative request URL, keeping method and mode.
    fn normalize(&self, request: &Request) -> Result<Request> {
        Ok(Request {
            url: self.config.resolve(&request.url)?.to_string(),
            method: request.method.clone(),
            mode: request.mode,
        })
    }

    /// Notification content for a push message.
    pub fn notification_options(&self, message: &PushMessage) -> NotificationOptions {
        let notification = &self.config.notification;
        NotificationOptions {
            body: message
                .data_text()
                .unwrap_or_else(|| notification.default_body.clone()),
            icon: notification.icon.clone(),
            badge: notification.badge.clone(),
            vibrate: notification.vibrate.clone(),
            data: NotificationData {
                date_of_arrival: Utc::now(),
                primary_key: 1,
            },
            actions: notification.actions.clone(),
        }
    }

    /// Cache first, then network.
    async fn serve(&self, request: &Request) -> Result<Response> {
        if let Some(response) = self.storage.match_request(request).await? {
            tracing::debug!(url = %request.url, "Serving from cache");
            return Ok(response);
        }
        self.fetcher.fetch(request).await
    }

    /// Cached root document for navigations that could not be served.
    async fn navigation_fallback(&self, request: &Request) -> Result<Response> {
        let fallback = self.fallback_request()?;
        self.storage
            .match_request(&fallback)
            .await?
            .ok_or_else(|| AgentError::NoFallback(request.url.clone()))
    }

    /// Replay requests queued while offline.
    ///
    /// Extension point: no offline request queue exists yet, so there is
    /// nothing to replay and this always succeeds.
    async fn replay_offline_requests(&self) -> Result<()> {
        tracing::debug!("No queued offline requests to replay");
        Ok(())
    }

    /// Re-fetch the root document into the current cache.
    async fn refresh_content(&self) -> Result<()> {
        let cache = self.storage.open(&self.cache_name()).await?;
        cache::add(&cache, &self.fetcher, &self.fallback_request()?).await
    }
}

#[async_trait]
impl<S, F, H> EventHandler for CacheAgent<S, F, H>
where
    S: CacheStorage,
    F: Fetcher,
    H: WorkerHost,
{
    async fn on_install(&self) -> Result<()> {
        let name = self.cache_name();
        tracing::info!(cache = %name, "Installing");

        let cache = self.storage.open(&name).await?;
        let requests = self.precache_requests()?;
        tracing::info!(cache = %name, count = requests.len(), "Caching files");
        cache::add_all(&cache, &self.fetcher, &requests).await?;

        self.host.skip_waiting().await
    }

    async fn on_activate(&self) -> Result<Vec<String>> {
        let current = self.cache_name();
        tracing::info!(cache = %current, "Activating");

        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| *name != current)
            .collect();

        try_join_all(stale.iter().map(|name| {
            tracing::info!(cache = %name, "Deleting old cache");
            self.storage.delete(name)
        }))
        .await?;

        self.host.claim_clients().await?;
        Ok(stale)
    }

    async fn on_fetch(&self, request: &Request) -> Result<FetchOutcome> {
        // Checked on the raw URL so unparsable backend URLs still pass through
        if self.config.is_bypassed(&request.url) {
            tracing::debug!(url = %request.url, "Passing through to network");
            return Ok(FetchOutcome::PassThrough);
        }
        let request = self.normalize(request)?;

        match self.serve(&request).await {
            Ok(response) => Ok(FetchOutcome::Respond(response)),
            Err(e) if request.is_navigation() => {
                tracing::warn!(url = %request.url, error = %e, "Offline navigation, serving fallback");
                self.navigation_fallback(&request)
                    .await
                    .map(FetchOutcome::Respond)
            }
            Err(e) => Err(e),
        }
    }

    async fn on_push(&self, message: &PushMessage) -> Result<()> {
        tracing::info!("Push notification received");
        let options = self.notification_options(message);
        self.host
            .show_notification(&self.config.notification.title, options)
            .await
    }

    async fn on_notification_click(&self, click: &NotificationClick) -> Result<()> {
        tracing::info!(action = %click.action, "Notification clicked");
        if let Err(e) = self.host.close_notification(&click.notification).await {
            tracing::warn!(error = %e, "Failed to close notification");
        }

        if click.action == PLAY_ACTION {
            let url = self.config.resolve(&self.config.fallback_document)?;
            self.host.open_window(url.as_str()).await?;
        }
        Ok(())
    }

    async fn on_sync(&self, tag: &str) -> Result<()> {
        if tag != self.config.sync_tag {
            tracing::debug!(tag, "Ignoring unknown sync tag");
            return Ok(());
        }

        tracing::info!(tag, "Syncing offline requests");
        self.replay_offline_requests().await
    }

    async fn on_periodic_sync(&self, tag: &str) -> Result<()> {
        if tag != self.config.periodic_sync_tag {
            tracing::debug!(tag, "Ignoring unknown periodic sync tag");
            return Ok(());
        }

        tracing::info!(tag, "Periodic sync triggered, updating content");
        if let Err(e) = self.refresh_content().await {
            tracing::error!(error = %e, "Failed to update content");
        }
        Ok(())
    }
}

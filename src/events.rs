//! Host event interface.
//!
//! The host platform delivers lifecycle, fetch, push, and sync events. Each
//! kind maps to one method on [`EventHandler`]; [`dispatch`] is the thin
//! adapter a host calls with an [`AgentEvent`]. Awaiting the returned future
//! is what keeps the event alive until its work completes.

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::platform::{NotificationClick, PushMessage, Request, Response};

/// Result of intercepting a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs its default network handling.
    PassThrough,
    /// Answered by the agent, from cache or network.
    Respond(Response),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Respond(response) => Some(response),
            FetchOutcome::PassThrough => None,
        }
    }
}

/// One method per host event kind.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Populate the current cache generation. An error fails the install
    /// and the host retries later.
    async fn on_install(&self) -> Result<()>;

    /// Remove stale generations and take control of open pages.
    /// Returns the names of deleted caches.
    async fn on_activate(&self) -> Result<Vec<String>>;

    async fn on_fetch(&self, request: &Request) -> Result<FetchOutcome>;

    async fn on_push(&self, message: &PushMessage) -> Result<()>;

    async fn on_notification_click(&self, click: &NotificationClick) -> Result<()>;

    async fn on_sync(&self, tag: &str) -> Result<()>;

    async fn on_periodic_sync(&self, tag: &str) -> Result<()>;
}

/// An event as delivered by the host.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    Install,
    Activate,
    Fetch(Request),
    Push(PushMessage),
    NotificationClick(NotificationClick),
    Sync { tag: String },
    PeriodicSync { tag: String },
}

impl AgentEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::Install => "install",
            AgentEvent::Activate => "activate",
            AgentEvent::Fetch(_) => "fetch",
            AgentEvent::Push(_) => "push",
            AgentEvent::NotificationClick(_) => "notificationclick",
            AgentEvent::Sync { .. } => "sync",
            AgentEvent::PeriodicSync { .. } => "periodicsync",
        }
    }
}

/// What the host should do after an event was handled.
#[derive(Debug)]
pub enum EventOutcome {
    Completed,
    /// Activation finished; these caches were deleted.
    Activated(Vec<String>),
    Fetch(FetchOutcome),
    /// The handler failed. The agent stays alive; the host applies its
    /// native failure handling (retry install, fail the request, and so on).
    Failed(AgentError),
}

impl EventOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, EventOutcome::Failed(_))
    }
}

/// Deliver one event to a handler. Never panics on handler failure.
pub async fn dispatch<H: EventHandler + ?Sized>(handler: &H, event: AgentEvent) -> EventOutcome {
    let kind = event.kind();
    let result = match event {
        AgentEvent::Install => handler.on_install().await.map(|_| EventOutcome::Completed),
        AgentEvent::Activate => handler.on_activate().await.map(EventOutcome::Activated),
        AgentEvent::Fetch(request) => handler.on_fetch(&request).await.map(EventOutcome::Fetch),
        AgentEvent::Push(message) => handler.on_push(&message).await.map(|_| EventOutcome::Completed),
        AgentEvent::NotificationClick(click) => handler
            .on_notification_click(&click)
            .await
            .map(|_| EventOutcome::Completed),
        AgentEvent::Sync { tag } => handler.on_sync(&tag).await.map(|_| EventOutcome::Completed),
        AgentEvent::PeriodicSync { tag } => handler
            .on_periodic_sync(&tag)
            .await
            .map(|_| EventOutcome::Completed),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(event = kind, error = %e, "Event handler failed");
        EventOutcome::Failed(e)
    })
}

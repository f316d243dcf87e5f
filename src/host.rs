// Headless worker host.
// Stands in for the browser's lifecycle, window, and notification services by
// logging each request and recording it for inspection.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;
use crate::platform::{Notification, NotificationOptions, WorkerHost};

#[derive(Debug, Default)]
pub struct HeadlessHost {
    skipped_waiting: AtomicBool,
    claimed_clients: AtomicBool,
    opened_windows: Mutex<Vec<String>>,
    notifications: Mutex<Vec<Notification>>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skipped_waiting(&self) -> bool {
        self.skipped_waiting.load(Ordering::SeqCst)
    }

    pub fn claimed_clients(&self) -> bool {
        self.claimed_clients.load(Ordering::SeqCst)
    }

    /// URLs of windows opened so far.
    pub fn opened_windows(&self) -> Vec<String> {
        self.opened_windows.lock().clone()
    }

    /// Notifications currently on screen.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }
}

#[async_trait]
impl WorkerHost for HeadlessHost {
    async fn skip_waiting(&self) -> Result<()> {
        tracing::debug!("Skipping waiting phase");
        self.skipped_waiting.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<()> {
        tracing::debug!("Claiming open clients");
        self.claimed_clients.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<()> {
        tracing::info!(url, "Opening window");
        self.opened_windows.lock().push(url.to_string());
        Ok(())
    }

    async fn show_notification(&self, title: &str, options: NotificationOptions) -> Result<()> {
        tracing::info!(title, body = %options.body, "Showing notification");
        self.notifications.lock().push(Notification {
            title: title.to_string(),
            options,
        });
        Ok(())
    }

    async fn close_notification(&self, notification: &Notification) -> Result<()> {
        self.notifications.lock().retain(|n| n != notification);
        Ok(())
    }
}

// Agent configuration.
// Cache identity, precache asset list, bypass substrings, and notification content.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AgentError, Result};
use crate::platform::NotificationAction;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "OFFLINE_SHELL_CONFIG";

/// Assets cached on install for the NABS Radio shell.
const DEFAULT_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/manifest.json",
    "/icon-192.png",
    "/icon-512.png",
    "https://cdn.tailwindcss.com",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css",
    "https://fonts.googleapis.com/css2?family=Cinzel:wght@700&family=Lora:ital,wght@0,400;0,700;1,400&family=Montserrat:wght@300;400;600;800&display=swap",
];

/// Dynamic backends that must always hit the network.
const DEFAULT_BYPASS: &[&str] = &["firebase", "api.openweathermap.org", "freesound.org"];

/// Top-level agent configuration, injected at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Application name, first half of the cache identifier.
    pub app_name: String,
    /// Version tag, second half of the cache identifier.
    pub version: String,
    /// Origin the shell is served from; relative assets resolve against it.
    pub origin: String,
    /// Ordered list of assets to precache.
    pub assets: Vec<String>,
    /// URL substrings that are never intercepted.
    pub bypass_patterns: Vec<String>,
    /// Document served to navigations when cache and network both fail.
    pub fallback_document: String,
    /// Background sync tag that triggers the offline request replay hook.
    pub sync_tag: String,
    /// Periodic sync tag that refreshes the fallback document.
    pub periodic_sync_tag: String,
    /// Network timeout for the HTTP fetcher.
    pub fetch_timeout_secs: u64,
    /// Override for the on-disk cache root.
    pub cache_dir: Option<PathBuf>,
    pub notification: NotificationConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            app_name: "nabs-radio".to_string(),
            version: "v1".to_string(),
            origin: "http://localhost:8080".to_string(),
            assets: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
            bypass_patterns: DEFAULT_BYPASS.iter().map(|s| s.to_string()).collect(),
            fallback_document: "/".to_string(),
            sync_tag: "sync-requests".to_string(),
            periodic_sync_tag: "update-content".to_string(),
            fetch_timeout_secs: 30,
            cache_dir: None,
            notification: NotificationConfig::default(),
        }
    }
}

/// Content of push notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub title: String,
    /// Body used when a push message carries no text.
    pub default_body: String,
    pub icon: String,
    pub badge: String,
    /// Vibration pattern in milliseconds.
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "NABS Radio".to_string(),
            default_body: "New update from NABS Radio!".to_string(),
            icon: "/icon-192.png".to_string(),
            badge: "/icon-192.png".to_string(),
            vibrate: vec![200, 100, 200],
            actions: vec![
                NotificationAction::new("play", "Play Now", "/icon-192.png"),
                NotificationAction::new("close", "Close", "/icon-192.png"),
            ],
        }
    }
}

impl AgentConfig {
    /// Load configuration from a JSON file, the `OFFLINE_SHELL_CONFIG`
    /// variable, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
        };

        let config = match path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "Loading agent configuration");
                let contents = std::fs::read_to_string(&p)?;
                serde_json::from_str(&contents)?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Name of the current cache generation, e.g. `nabs-radio-v1`.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.app_name, self.version)
    }

    pub fn origin_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.origin)?)
    }

    /// Resolve a relative path or absolute URL against the origin.
    pub fn resolve(&self, locator: &str) -> Result<Url> {
        let mut url = self.origin_url()?.join(locator)?;
        url.set_fragment(None);
        Ok(url)
    }

    /// Whether a request URL targets one of the bypassed backends.
    pub fn is_bypassed(&self, url: &str) -> bool {
        self.bypass_patterns
            .iter()
            .any(|pattern| url.contains(pattern.as_str()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() || self.version.trim().is_empty() {
            return Err(AgentError::Config(
                "app_name and version must not be empty".to_string(),
            ));
        }

        let origin = self.origin_url()?;
        if origin.cannot_be_a_base() {
            return Err(AgentError::Config(format!(
                "origin {} cannot resolve relative assets",
                self.origin
            )));
        }

        for asset in &self.assets {
            self.resolve(asset)
                .map_err(|e| AgentError::Config(format!("asset {}: {}", asset, e)))?;
        }
        self.resolve(&self.fallback_document)?;

        Ok(())
    }
}

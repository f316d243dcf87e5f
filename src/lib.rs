// Offline cache agent for the NABS Radio web app shell.
// Precaches the shell, serves requests cache-first, and handles push and sync events.

pub mod agent;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod logging;
pub mod network;
pub mod platform;
#[cfg(test)]
pub(crate) mod testing;

pub use agent::CacheAgent;
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use events::{AgentEvent, EventHandler, EventOutcome, FetchOutcome, dispatch};

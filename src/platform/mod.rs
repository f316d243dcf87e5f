// Host platform module.
// Types and collaborator traits the agent uses to reach cache storage, network, and UI.

pub mod traits;
pub mod types;

pub use traits::{Cache, CacheStorage, Fetcher, WorkerHost};
pub use types::*;

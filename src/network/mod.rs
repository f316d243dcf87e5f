// Network module.
// Provides the reqwest-backed fetcher used outside of tests.

pub mod client;

pub use client::HttpFetcher;

//! Upstream listings provider plumbing for homesift.
//!
//! This crate owns everything that touches the network: provider
//! configuration, the retrying HTTP client and the lenient wire records the
//! provider returns. The search engine in the `homesift` crate builds URLs
//! from a [`ProviderConfig`] and fetches them through a [`PropertyProvider`].

pub mod client;
pub mod config;
mod error;
pub mod records;
pub mod retry;

pub use client::{HttpProvider, PropertyProvider};
pub use config::{ProviderConfig, ProviderConfigBuilder};
pub use error::{ProviderError, Result};
pub use records::{PropertyRecord, RecordAddress, UpstreamPayload};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper, fetch_with_retry};

// Re-exported so downstream crates build URLs against the same type.
pub use reqwest::Url;

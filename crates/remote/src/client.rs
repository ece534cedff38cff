//! Shared HTTP client construction.

use std::time::Duration;

use reqwest::blocking::Client;
use validator_core::config::RemoteConfig;
use validator_core::{Error, Result};

/// Blocking client with the configured timeout and User-Agent.
pub fn build_client(config: &RemoteConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))
}

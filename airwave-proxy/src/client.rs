//! Shared upstream HTTP client

use std::time::Duration;

use airwave_core::config::UpstreamConfig;
use reqwest::redirect::Policy;

use crate::{ProxyError, Result};

/// Build the client used for every upstream fetch.
///
/// Redirects are followed inside the client so a renamed manifest never reaches
/// the player as a 3xx.
pub fn build_http_client(config: &UpstreamConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .redirect(Policy::limited(config.max_redirects))
        .build()
        .map_err(|e| ProxyError::Transport(format!("Failed to build HTTP client: {e}")))
}

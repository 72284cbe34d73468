//! Shared HTTP client configuration.

use crate::config::Settings;
use crate::error::{DistillError, Result};
use std::time::Duration;

/// Create an HTTP client with the configured timeout and user agent.
///
/// Every outbound call (robots.txt, pages, caption tracks, generation APIs)
/// goes through a client built here, so no request can hang forever.
pub fn create_client(settings: &Settings) -> Result<reqwest::Client> {
    create_client_with(
        Duration::from_secs(settings.general.request_timeout_secs),
        &settings.general.user_agent,
    )
}

/// Create an HTTP client with an explicit timeout and user agent.
pub fn create_client_with(timeout: Duration, user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| DistillError::Config(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_from_default_settings() {
        assert!(create_client(&Settings::default()).is_ok());
    }

    #[test]
    fn test_invalid_user_agent_is_config_error() {
        let err = create_client_with(Duration::from_secs(1), "bad\nagent").unwrap_err();
        assert!(matches!(err, DistillError::Config(_)));
    }
}

//! Configuration of the outbound HTTP clients.

use std::time::Duration;

use crate::client::HttpCollaborators;
use crate::error::HttpClientError;

/// Where the collaborators live and how long to wait for them.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the device registry (e.g. `http://device-service:8080`).
    pub device_service_url: String,
    /// Base URL of the notification service.
    pub notification_url: String,
    /// Timeout applied to every request, connect included.
    pub timeout: Duration,
}

impl Config {
    /// Build the [`HttpCollaborators`] described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] if a base URL is empty or the client
    /// cannot be built.
    pub fn build(self) -> Result<HttpCollaborators, HttpClientError> {
        if self.device_service_url.is_empty() {
            return Err(HttpClientError::MissingUrl("device service"));
        }
        if self.notification_url.is_empty() {
            return Err(HttpClientError::MissingUrl("notification service"));
        }
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        Ok(HttpCollaborators::new(
            client,
            self.device_service_url.trim_end_matches('/'),
            self.notification_url.trim_end_matches('/'),
        ))
    }
}

//! OI.Share HTTP client
//!
//! reqwest-based `ControlTransport`. All commands are plain GETs against
//! the camera's fixed address.

use super::types::{CameraCommand, CommandResponse, ControlTransport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Default camera address in access-point mode
pub const DEFAULT_BASE_URL: &str = "http://192.168.0.10";

/// The camera refuses clients that do not identify as the official app
pub const DEFAULT_USER_AGENT: &str = "OI.Share v2";

/// Camera control-plane client
pub struct CameraClient {
    /// Base URL (e.g. http://192.168.0.10)
    base_url: String,
    /// HTTP client
    client: Client,
}

impl CameraClient {
    /// Create new client
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Client with the factory defaults
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL, DEFAULT_USER_AGENT, Duration::from_secs(10))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, command: &CameraCommand) -> String {
        format!("{}{}", self.base_url, command.path())
    }
}

#[async_trait]
impl ControlTransport for CameraClient {
    async fn execute(&self, command: &CameraCommand) -> Result<CommandResponse> {
        let url = self.url_for(command);

        tracing::debug!(
            command = command.name(),
            url = %url,
            "Sending camera command"
        );

        let request = self.client.get(&url).query(&command.query()).build()?;
        let expected_path = request.url().path().to_string();

        let response = self.client.execute(request).await?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(
                command = command.name(),
                status = %status,
                "Camera command rejected"
            );
            return Err(Error::Protocol {
                command: command.name().to_string(),
                status: status.as_u16(),
            });
        }

        let actual_path = response.url().path().to_string();
        if actual_path != expected_path {
            return Err(Error::UnexpectedPath {
                expected: expected_path,
                actual: actual_path,
            });
        }

        let body = response.bytes().await?;

        tracing::trace!(
            command = command.name(),
            bytes = body.len(),
            "Camera command completed"
        );

        Ok(CommandResponse::new(body.to_vec()))
    }
}

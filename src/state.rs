//! Application configuration
//!
//! Read from the environment (after `.env`), overridable from the CLI.

use crate::camera_client::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::connection_monitor::DEFAULT_POLL_INTERVAL_MS;
use crate::live_view::DEFAULT_UDP_PORT;
use crate::models::LiveViewQuality;
use std::path::PathBuf;
use std::time::Duration;

/// Camera-side directory holding the pictures
pub const DEFAULT_IMAGE_DIR: &str = "/DCIM/100OLYMP";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Camera control endpoint
    pub camera_url: String,
    /// DCIM directory on the camera
    pub image_dir: String,
    /// Local UDP port for live view
    pub udp_port: u16,
    /// Connection probe interval
    pub poll_interval: Duration,
    /// HTTP request timeout
    pub http_timeout: Duration,
    /// User-Agent presented to the camera
    pub user_agent: String,
    /// Live view preview quality
    pub live_view_quality: LiveViewQuality,
    /// Where downloaded images are written
    pub output_dir: PathBuf,
    /// Capacity of the frame channel handed to live view consumers
    pub frame_queue: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            camera_url: std::env::var("OIS_CAMERA_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            image_dir: std::env::var("OIS_IMAGE_DIR")
                .unwrap_or_else(|_| DEFAULT_IMAGE_DIR.to_string()),
            udp_port: env_parse("OIS_UDP_PORT").unwrap_or(DEFAULT_UDP_PORT),
            poll_interval: Duration::from_millis(
                env_parse("OIS_POLL_INTERVAL_MS").unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            http_timeout: Duration::from_secs(env_parse("OIS_HTTP_TIMEOUT_SECS").unwrap_or(10)),
            user_agent: std::env::var("OIS_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            live_view_quality: env_parse("OIS_LIVEVIEW_QUALITY").unwrap_or_default(),
            output_dir: std::env::var("OIS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            frame_queue: env_parse("OIS_FRAME_QUEUE").unwrap_or(3),
        }
    }
}

impl AppConfig {
    /// Camera-side path of a picture in the image directory
    pub fn image_path(&self, filename: &str) -> String {
        format!("{}/{}", self.image_dir.trim_end_matches('/'), filename)
    }
}

/// Parse an env var; unparsable values are logged and treated as unset
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key = key, value = %value, "Invalid environment value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_path() {
        let config = AppConfig {
            image_dir: "/DCIM/100OLYMP/".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.image_path("P1.JPG"), "/DCIM/100OLYMP/P1.JPG");
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("OIS_STATE_TEST_PORT", "not-a-port");
        assert_eq!(env_parse::<u16>("OIS_STATE_TEST_PORT"), None);

        std::env::set_var("OIS_STATE_TEST_PORT", " 28500 ");
        assert_eq!(env_parse::<u16>("OIS_STATE_TEST_PORT"), Some(28500));

        std::env::remove_var("OIS_STATE_TEST_PORT");
        assert_eq!(env_parse::<u16>("OIS_STATE_TEST_PORT"), None);
    }

    #[test]
    fn test_defaults_without_env() {
        // only checks keys no test sets
        let config = AppConfig::default();
        if std::env::var("OIS_FRAME_QUEUE").is_err() {
            assert_eq!(config.frame_queue, 3);
        }
        if std::env::var("OIS_POLL_INTERVAL_MS").is_err() {
            assert_eq!(config.poll_interval, Duration::from_millis(5000));
        }
        if std::env::var("OIS_LIVEVIEW_QUALITY").is_err() {
            assert_eq!(config.live_view_quality, LiveViewQuality::Q640x480);
        }
    }
}

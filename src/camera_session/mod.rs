//! CameraSession - one connected camera
//!
//! ## Responsibilities
//!
//! - Wire transport, mode controller, sequencer, live view and monitor
//! - Passthrough calls (info, image list, downloads, AF point, power off)
//! - Own the connection monitor for the session's lifetime

use crate::camera_client::{CameraClient, CameraCommand, ControlTransport};
use crate::connection_monitor::{ConnectionMonitor, ConnectionSnapshot, ConnectionStatus};
use crate::error::Result;
use crate::frame_reassembler::Frame;
use crate::live_view::{LiveViewSession, LiveViewState, LiveViewStats};
use crate::mode_controller::{ModeController, ModeTransitions};
use crate::models::{CameraMode, ImageEntry, LiveViewQuality, ResizeSize};
use crate::shutter_sequencer::{ShutterSequencer, CAPTURE_QUALITY};
use crate::state::AppConfig;
use std::sync::Arc;
use tokio::sync::mpsc;

/// CameraSession instance
pub struct CameraSession {
    config: AppConfig,
    transport: Arc<dyn ControlTransport>,
    modes: Arc<ModeController>,
    shutter: ShutterSequencer,
    live_view: LiveViewSession,
    monitor: ConnectionMonitor,
}

impl CameraSession {
    /// Connect to the camera described by `config`
    ///
    /// Starts the connection monitor, so this must run inside a tokio runtime.
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = CameraClient::new(&config.camera_url, &config.user_agent, config.http_timeout)?;
        Ok(Self::with_transport(config, Arc::new(client)))
    }

    /// Build a session over any control transport
    pub fn with_transport(config: AppConfig, transport: Arc<dyn ControlTransport>) -> Self {
        let modes = Arc::new(ModeController::new(transport.clone()));
        let shutter = ShutterSequencer::new(transport.clone(), modes.clone());
        let live_view = LiveViewSession::new(transport.clone(), modes.clone(), config.udp_port)
            .with_quality(config.live_view_quality);
        let monitor = ConnectionMonitor::start(
            transport.clone(),
            live_view.streaming_flag(),
            config.poll_interval,
        );

        tracing::info!(
            camera_url = %config.camera_url,
            udp_port = config.udp_port,
            "Camera session created"
        );

        Self {
            config,
            transport,
            modes,
            shutter,
            live_view,
            monitor,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // ========================================
    // Modes and capture
    // ========================================

    pub async fn mode(&self) -> CameraMode {
        self.modes.current().await
    }

    pub async fn switch_mode(
        &self,
        mode: CameraMode,
        quality: Option<LiveViewQuality>,
    ) -> Result<()> {
        self.modes.switch_to(mode, quality).await
    }

    /// Take a picture and return its JPEG bytes
    pub async fn take(&self) -> Result<Vec<u8>> {
        self.shutter.take().await
    }

    // ========================================
    // Live view
    // ========================================

    /// Start live view and return the frame stream
    pub async fn start_live_view(&self) -> Result<mpsc::Receiver<Frame>> {
        let (tx, rx) = mpsc::channel(self.config.frame_queue.max(1));
        self.live_view.start(tx).await?;
        Ok(rx)
    }

    pub async fn stop_live_view(&self) -> Result<()> {
        self.live_view.stop().await
    }

    pub async fn live_view_state(&self) -> LiveViewState {
        self.live_view.state().await
    }

    pub fn live_view_stats(&self) -> LiveViewStats {
        self.live_view.stats()
    }

    // ========================================
    // Connection
    // ========================================

    /// Probe the camera now
    pub async fn connect(&self) -> ConnectionStatus {
        self.monitor.check_now().await
    }

    pub async fn connection(&self) -> ConnectionSnapshot {
        self.monitor.snapshot().await
    }

    // ========================================
    // Passthrough
    // ========================================

    /// get_caminfo.cgi body (XML with the camera model)
    pub async fn info(&self) -> Result<String> {
        let response = self.transport.execute(&CameraCommand::CameraInfo).await?;
        Ok(response.text())
    }

    /// Pictures in the configured DCIM directory
    pub async fn list_images(&self) -> Result<Vec<ImageEntry>> {
        self.modes.switch_to(CameraMode::Play, None).await?;

        let response = self
            .transport
            .execute(&CameraCommand::ListImages {
                dir: self.config.image_dir.clone(),
            })
            .await?;

        let images = ImageEntry::parse_list(&response.text());
        tracing::debug!(count = images.len(), "Image list received");
        Ok(images)
    }

    /// Full-size picture
    pub async fn image(&self, filename: &str) -> Result<Vec<u8>> {
        self.modes.switch_to(CameraMode::Play, None).await?;

        let response = self
            .transport
            .execute(&CameraCommand::Image {
                path: self.config.image_path(filename),
            })
            .await?;
        Ok(response.into_bytes())
    }

    /// Embedded thumbnail (also works for raw files)
    pub async fn thumbnail(&self, filename: &str) -> Result<Vec<u8>> {
        self.modes.switch_to(CameraMode::Play, None).await?;

        let response = self
            .transport
            .execute(&CameraCommand::Thumbnail {
                path: self.config.image_path(filename),
            })
            .await?;
        Ok(response.into_bytes())
    }

    /// Camera-side resized copy of a picture
    pub async fn resized(&self, filename: &str, size: ResizeSize) -> Result<Vec<u8>> {
        // get_resizeimg.cgi only answers in rec mode
        self.modes
            .switch_to(CameraMode::LiveView, Some(CAPTURE_QUALITY))
            .await?;

        let response = self
            .transport
            .execute(&CameraCommand::Resize {
                path: self.config.image_path(filename),
                size,
            })
            .await?;
        Ok(response.into_bytes())
    }

    /// Move the AF point to (x, y) in live view coordinates
    pub async fn auto_focus(&self, x: u32, y: u32) -> Result<String> {
        self.modes
            .switch_to(CameraMode::LiveView, Some(CAPTURE_QUALITY))
            .await?;

        let response = self
            .transport
            .execute(&CameraCommand::AssignAfFrame { x, y })
            .await?;

        tracing::debug!(x = x, y = y, "AF point assigned");
        Ok(response.text())
    }

    /// Turn the camera off
    pub async fn power_off(&self) -> Result<()> {
        self.transport.execute(&CameraCommand::PowerOff).await?;
        tracing::info!("Camera powered off");
        Ok(())
    }

    /// Stop live view and the monitor
    pub async fn close(&self) -> Result<()> {
        let result = self.live_view.stop().await;
        self.monitor.stop();
        result
    }
}

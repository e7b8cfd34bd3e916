//! ModeController - camera mode state machine
//!
//! ## Responsibilities
//!
//! - Track the mode the camera was last switched into
//! - Issue switch_cammode.cgi for real transitions only
//! - Serialize transitions between concurrent callers

use crate::camera_client::{CameraCommand, ControlTransport};
use crate::error::{Error, Result};
use crate::models::{CameraMode, LiveViewQuality};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mode transitions as seen by the sequencers
#[async_trait]
pub trait ModeTransitions: Send + Sync {
    /// Mode currently tracked for the camera
    async fn current(&self) -> CameraMode;

    /// Switch the camera into `mode`; no-op when already there
    async fn switch_to(&self, mode: CameraMode, quality: Option<LiveViewQuality>) -> Result<()>;
}

/// ModeController instance
pub struct ModeController {
    transport: Arc<dyn ControlTransport>,
    /// Held across the HTTP call so transitions never interleave
    mode: Mutex<CameraMode>,
}

impl ModeController {
    /// Create new ModeController; the initial mode is `Unknown`
    pub fn new(transport: Arc<dyn ControlTransport>) -> Self {
        Self {
            transport,
            mode: Mutex::new(CameraMode::Unknown),
        }
    }

    /// Override the tracked mode without contacting the camera
    /// (e.g. after the mode dial was turned by hand)
    pub async fn assume(&self, mode: CameraMode) {
        let mut current = self.mode.lock().await;
        tracing::debug!(from = %*current, to = %mode, "Camera mode assumed");
        *current = mode;
    }
}

#[async_trait]
impl ModeTransitions for ModeController {
    async fn current(&self) -> CameraMode {
        *self.mode.lock().await
    }

    async fn switch_to(&self, mode: CameraMode, quality: Option<LiveViewQuality>) -> Result<()> {
        let mut current = self.mode.lock().await;

        if *current == mode {
            return Ok(());
        }

        if mode == CameraMode::Unknown {
            return Err(Error::Validation(
                "cannot switch camera into unknown mode".to_string(),
            ));
        }

        let command = CameraCommand::SwitchMode { mode, quality };
        self.transport.execute(&command).await?;

        tracing::info!(from = %*current, to = %mode, "Camera mode switched");
        *current = mode;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_client::testing::RecordingTransport;

    fn controller() -> (Arc<RecordingTransport>, ModeController) {
        let transport = Arc::new(RecordingTransport::new());
        let controller = ModeController::new(transport.clone());
        (transport, controller)
    }

    #[tokio::test]
    async fn test_initial_mode_unknown() {
        let (_, controller) = controller();
        assert_eq!(controller.current().await, CameraMode::Unknown);
    }

    #[tokio::test]
    async fn test_switch_updates_mode() {
        let (transport, controller) = controller();
        controller.switch_to(CameraMode::Play, None).await.unwrap();

        assert_eq!(controller.current().await, CameraMode::Play);
        assert_eq!(
            transport.calls(),
            vec![CameraCommand::SwitchMode {
                mode: CameraMode::Play,
                quality: None
            }]
        );
    }

    #[tokio::test]
    async fn test_same_mode_is_noop() {
        let (transport, controller) = controller();
        controller
            .switch_to(CameraMode::LiveView, Some(LiveViewQuality::Q640x480))
            .await
            .unwrap();
        controller
            .switch_to(CameraMode::LiveView, Some(LiveViewQuality::Q640x480))
            .await
            .unwrap();

        assert_eq!(transport.count("switch-mode"), 1);
    }

    #[tokio::test]
    async fn test_failed_switch_keeps_mode() {
        let (transport, controller) = controller();
        controller.switch_to(CameraMode::Play, None).await.unwrap();

        transport.fail("switch-mode");
        let err = controller
            .switch_to(CameraMode::Shutter, None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Protocol { status: 503, .. }));
        assert_eq!(controller.current().await, CameraMode::Play);
    }

    #[tokio::test]
    async fn test_unknown_target_rejected_without_call() {
        let (transport, controller) = controller();
        controller.assume(CameraMode::Play).await;

        let err = controller
            .switch_to(CameraMode::Unknown, None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_assume_does_not_contact_camera() {
        let (transport, controller) = controller();
        controller.assume(CameraMode::Shutter).await;

        assert_eq!(controller.current().await, CameraMode::Shutter);
        controller.switch_to(CameraMode::Shutter, None).await.unwrap();
        assert!(transport.calls().is_empty());
    }
}

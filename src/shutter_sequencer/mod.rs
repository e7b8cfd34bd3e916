//! ShutterSequencer - `take` for every camera mode
//!
//! ## Responsibilities
//!
//! - Map the current mode to a capture plan
//! - Run the plan's HTTP steps strictly in order
//! - Switch out of playback and retry at most once

use crate::camera_client::{CameraCommand, ControlTransport};
use crate::error::{Error, Result};
use crate::mode_controller::ModeTransitions;
use crate::models::{CameraMode, LiveViewQuality};
use std::sync::Arc;

/// Preview quality the firmware expects while capturing
pub const CAPTURE_QUALITY: LiveViewQuality = LiveViewQuality::Q640x480;

/// Extra attempts after switching out of a non-capturing mode
const MAX_RETRIES: u32 = 1;

/// One step of a capture plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStep {
    /// Issue a command; the last one's body is the captured image
    Command(CameraCommand),
    /// (Re-)assert a mode through the ModeController
    EnsureMode(CameraMode, LiveViewQuality),
}

/// What `take` does for a given precondition mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturePlan {
    /// Run the steps in order
    Capture(Vec<CaptureStep>),
    /// Switch mode, then plan again
    SwitchThenRetry(CameraMode),
    /// Nothing sensible to do
    NoAction,
}

impl CapturePlan {
    /// Plan table keyed on the current mode
    pub fn for_mode(mode: CameraMode) -> Self {
        match mode {
            CameraMode::Shutter => Self::Capture(vec![
                CaptureStep::Command(CameraCommand::ShutterPush),
                CaptureStep::Command(CameraCommand::ShutterRelease),
                CaptureStep::EnsureMode(CameraMode::LiveView, CAPTURE_QUALITY),
                CaptureStep::Command(CameraCommand::GetLastJpg),
            ]),
            CameraMode::LiveView => Self::Capture(vec![
                CaptureStep::Command(CameraCommand::StartTake),
                // firmware needs rec mode re-asserted before getrecview
                CaptureStep::EnsureMode(CameraMode::LiveView, CAPTURE_QUALITY),
                CaptureStep::Command(CameraCommand::GetRecView),
            ]),
            CameraMode::Play => Self::SwitchThenRetry(CameraMode::Shutter),
            CameraMode::Unknown => Self::NoAction,
        }
    }
}

/// ShutterSequencer instance
pub struct ShutterSequencer {
    transport: Arc<dyn ControlTransport>,
    modes: Arc<dyn ModeTransitions>,
}

impl ShutterSequencer {
    pub fn new(transport: Arc<dyn ControlTransport>, modes: Arc<dyn ModeTransitions>) -> Self {
        Self { transport, modes }
    }

    /// Take a photo and return the JPEG the camera hands back
    pub async fn take(&self) -> Result<Vec<u8>> {
        let mut retries = 0;

        loop {
            let mode = self.modes.current().await;

            match CapturePlan::for_mode(mode) {
                CapturePlan::Capture(steps) => {
                    tracing::info!(mode = %mode, "Taking picture");
                    return self.run(&steps).await;
                }
                CapturePlan::SwitchThenRetry(target) if retries < MAX_RETRIES => {
                    tracing::debug!(from = %mode, to = %target, "Switching mode before take");
                    self.modes.switch_to(target, None).await?;
                    retries += 1;
                }
                CapturePlan::SwitchThenRetry(_) => {
                    tracing::warn!(mode = %mode, "Camera still not ready for capture after retry");
                    return Err(Error::NoAction(format!(
                        "camera stayed in {} mode after switching",
                        mode
                    )));
                }
                CapturePlan::NoAction => {
                    return Err(Error::NoAction(format!(
                        "cannot take a picture in {} mode",
                        mode
                    )));
                }
            }
        }
    }

    async fn run(&self, steps: &[CaptureStep]) -> Result<Vec<u8>> {
        let mut image = Vec::new();

        for step in steps {
            match step {
                CaptureStep::Command(command) => {
                    image = self.transport.execute(command).await?.into_bytes();
                }
                CaptureStep::EnsureMode(mode, quality) => {
                    self.modes.switch_to(*mode, Some(*quality)).await?;
                }
            }
        }

        tracing::info!(bytes = image.len(), "Picture taken");
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_client::testing::RecordingTransport;
    use crate::mode_controller::ModeController;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const JPEG: &[u8] = &[0xFF, 0xD8, 0x01, 0x02, 0xFF, 0xD9];

    fn sequencer() -> (Arc<RecordingTransport>, Arc<ModeController>, ShutterSequencer) {
        let transport = Arc::new(RecordingTransport::with_image(JPEG));
        let modes = Arc::new(ModeController::new(transport.clone()));
        let sequencer = ShutterSequencer::new(transport.clone(), modes.clone());
        (transport, modes, sequencer)
    }

    /// Mode source that never leaves Play, whatever it is told
    #[derive(Default)]
    struct StuckInPlay {
        switches: AtomicUsize,
    }

    #[async_trait]
    impl ModeTransitions for StuckInPlay {
        async fn current(&self) -> CameraMode {
            CameraMode::Play
        }

        async fn switch_to(&self, _: CameraMode, _: Option<LiveViewQuality>) -> Result<()> {
            self.switches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_take_in_shutter_mode() {
        let (transport, modes, sequencer) = sequencer();
        modes.assume(CameraMode::Shutter).await;

        let image = sequencer.take().await.unwrap();

        assert_eq!(image, JPEG);
        assert_eq!(
            transport.calls(),
            vec![
                CameraCommand::ShutterPush,
                CameraCommand::ShutterRelease,
                CameraCommand::SwitchMode {
                    mode: CameraMode::LiveView,
                    quality: Some(LiveViewQuality::Q640x480),
                },
                CameraCommand::GetLastJpg,
            ]
        );
        assert_eq!(modes.current().await, CameraMode::LiveView);
    }

    #[tokio::test]
    async fn test_take_in_liveview_mode_reasserts_without_call() {
        let (transport, modes, sequencer) = sequencer();
        modes.assume(CameraMode::LiveView).await;

        let image = sequencer.take().await.unwrap();

        assert_eq!(image, JPEG);
        assert_eq!(
            transport.calls(),
            vec![CameraCommand::StartTake, CameraCommand::GetRecView]
        );
    }

    #[tokio::test]
    async fn test_release_not_sent_when_push_fails() {
        let (transport, modes, sequencer) = sequencer();
        modes.assume(CameraMode::Shutter).await;
        transport.fail("shutter-phase1");

        let err = sequencer.take().await.unwrap_err();

        assert!(err.is_camera_failure());
        assert_eq!(transport.call_names(), vec!["shutter-phase1"]);
        assert_eq!(modes.current().await, CameraMode::Shutter);
    }

    #[tokio::test]
    async fn test_take_in_play_switches_and_retries_once() {
        let (transport, modes, sequencer) = sequencer();
        modes.assume(CameraMode::Play).await;

        let image = sequencer.take().await.unwrap();

        assert_eq!(image, JPEG);
        assert_eq!(
            transport.call_names(),
            vec![
                "switch-mode",
                "shutter-phase1",
                "shutter-phase2",
                "switch-mode",
                "fetch-last-image"
            ]
        );
        assert_eq!(
            transport.calls()[0],
            CameraCommand::SwitchMode {
                mode: CameraMode::Shutter,
                quality: None
            }
        );
    }

    #[tokio::test]
    async fn test_take_stuck_in_play_terminates() {
        let transport = Arc::new(RecordingTransport::with_image(JPEG));
        let stuck = Arc::new(StuckInPlay::default());
        let sequencer = ShutterSequencer::new(transport.clone(), stuck.clone());

        let err = sequencer.take().await.unwrap_err();

        assert!(matches!(err, Error::NoAction(_)));
        assert_eq!(stuck.switches.load(Ordering::SeqCst), 1);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_take_in_unknown_mode_is_no_action() {
        let (transport, _, sequencer) = sequencer();

        let err = sequencer.take().await.unwrap_err();

        assert!(matches!(err, Error::NoAction(_)));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_plan_table() {
        assert_eq!(
            CapturePlan::for_mode(CameraMode::Play),
            CapturePlan::SwitchThenRetry(CameraMode::Shutter)
        );
        assert_eq!(CapturePlan::for_mode(CameraMode::Unknown), CapturePlan::NoAction);
        match CapturePlan::for_mode(CameraMode::LiveView) {
            CapturePlan::Capture(steps) => assert_eq!(
                steps.last(),
                Some(&CaptureStep::Command(CameraCommand::GetRecView))
            ),
            other => panic!("unexpected plan {:?}", other),
        }
    }
}

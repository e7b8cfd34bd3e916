//! OIS Remote Library
//!
//! Remote control and live view driver for OI.Share Wi-Fi cameras.
//!
//! ## Architecture (8 Components)
//!
//! 1. CameraClient - HTTP control endpoint (`/*.cgi`)
//! 2. ModeController - Tracked camera mode, serialized switches
//! 3. ShutterSequencer - `take` for every mode
//! 4. FrameReassembler - RTP-style UDP datagrams to JPEG frames
//! 5. LiveViewSession - Start/stop lifecycle and receive loop
//! 6. ConnectionMonitor - Periodic reachability probe
//! 7. ImageStore - Local persistence of downloaded images
//! 8. CameraSession - Facade wiring the above for one camera
//!
//! ## Design Principles
//!
//! - One owner per concern: mode state lives only in the ModeController
//! - HTTP steps of a sequence never overlap
//! - Live view frames are delivered by value, never aliased

pub mod camera_client;
pub mod camera_session;
pub mod connection_monitor;
pub mod error;
pub mod frame_reassembler;
pub mod image_store;
pub mod live_view;
pub mod mode_controller;
pub mod models;
pub mod shutter_sequencer;
pub mod state;

pub use camera_session::CameraSession;
pub use error::{Error, Result};
pub use frame_reassembler::Frame;
pub use state::AppConfig;

//! Camera command table
//!
//! Every HTTP call the driver makes is one `CameraCommand`. The command knows
//! its CGI path and query; transports only have to execute it.

use crate::models::{CameraMode, LiveViewQuality, ResizeSize};
use async_trait::async_trait;

pub const PATH_SWITCH_MODE: &str = "/switch_cammode.cgi";
pub const PATH_TAKE_MISC: &str = "/exec_takemisc.cgi";
pub const PATH_TAKE_MOTION: &str = "/exec_takemotion.cgi";
pub const PATH_SHUTTER: &str = "/exec_shutter.cgi";
pub const PATH_CONNECT_MODE: &str = "/get_connectmode.cgi";
pub const PATH_CAMERA_INFO: &str = "/get_caminfo.cgi";
pub const PATH_IMAGE_LIST: &str = "/get_imglist.cgi";
pub const PATH_THUMBNAIL: &str = "/get_thumbnail.cgi";
pub const PATH_RESIZE: &str = "/get_resizeimg.cgi";
pub const PATH_POWER_OFF: &str = "/exec_pwoff.cgi";

/// A single control-plane request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraCommand {
    /// switch_cammode.cgi?mode=...[&lvqty=...]
    SwitchMode {
        mode: CameraMode,
        quality: Option<LiveViewQuality>,
    },
    StartLiveView { port: u16 },
    StopLiveView,
    /// Shutter phase 1
    ShutterPush,
    /// Shutter phase 2
    ShutterRelease,
    StartTake,
    AssignAfFrame { x: u32, y: u32 },
    GetLastJpg,
    GetRecView,
    ConnectMode,
    CameraInfo,
    ListImages { dir: String },
    Thumbnail { path: String },
    Resize { path: String, size: ResizeSize },
    /// Plain file download from the DCIM tree
    Image { path: String },
    PowerOff,
}

impl CameraCommand {
    /// Short name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::SwitchMode { .. } => "switch-mode",
            Self::StartLiveView { .. } => "start-liveview",
            Self::StopLiveView => "stop-liveview",
            Self::ShutterPush => "shutter-phase1",
            Self::ShutterRelease => "shutter-phase2",
            Self::StartTake => "start-take",
            Self::AssignAfFrame { .. } => "assign-af-frame",
            Self::GetLastJpg => "fetch-last-image",
            Self::GetRecView => "fetch-recent-view",
            Self::ConnectMode => "connection-mode",
            Self::CameraInfo => "camera-info",
            Self::ListImages { .. } => "list-images",
            Self::Thumbnail { .. } => "get-thumbnail",
            Self::Resize { .. } => "get-resized",
            Self::Image { .. } => "get-image",
            Self::PowerOff => "power-off",
        }
    }

    /// CGI path relative to the camera base URL
    pub fn path(&self) -> String {
        match self {
            Self::SwitchMode { .. } => PATH_SWITCH_MODE.to_string(),
            Self::StartLiveView { .. } | Self::StopLiveView | Self::GetLastJpg | Self::GetRecView => {
                PATH_TAKE_MISC.to_string()
            }
            Self::ShutterPush | Self::ShutterRelease => PATH_SHUTTER.to_string(),
            Self::StartTake | Self::AssignAfFrame { .. } => PATH_TAKE_MOTION.to_string(),
            Self::ConnectMode => PATH_CONNECT_MODE.to_string(),
            Self::CameraInfo => PATH_CAMERA_INFO.to_string(),
            Self::ListImages { .. } => PATH_IMAGE_LIST.to_string(),
            Self::Thumbnail { .. } => PATH_THUMBNAIL.to_string(),
            Self::Resize { .. } => PATH_RESIZE.to_string(),
            Self::Image { path } => {
                if path.starts_with('/') {
                    path.clone()
                } else {
                    format!("/{}", path)
                }
            }
            Self::PowerOff => PATH_POWER_OFF.to_string(),
        }
    }

    /// Query parameters, in the order the camera firmware expects them
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::SwitchMode { mode, quality } => {
                let mut q = Vec::with_capacity(2);
                if let Some(name) = mode.wire_name() {
                    q.push(("mode", name.to_string()));
                }
                if *mode == CameraMode::LiveView {
                    let quality = quality.unwrap_or_default();
                    q.push(("lvqty", quality.as_str().to_string()));
                }
                q
            }
            Self::StartLiveView { port } => vec![
                ("com", "startliveview".to_string()),
                ("port", port.to_string()),
            ],
            Self::StopLiveView => vec![("com", "stopliveview".to_string())],
            Self::ShutterPush => vec![("com", "1st2ndpush".to_string())],
            Self::ShutterRelease => vec![("com", "2nd1strelease".to_string())],
            Self::StartTake => vec![("com", "starttake".to_string())],
            Self::AssignAfFrame { x, y } => vec![
                ("com", "assignafframe".to_string()),
                ("point", format!("{:04}x{:04}", x, y)),
            ],
            Self::GetLastJpg => vec![("com", "getlastjpg".to_string())],
            Self::GetRecView => vec![("com", "getrecview".to_string())],
            Self::ListImages { dir } => vec![("DIR", dir.clone())],
            Self::Thumbnail { path } => vec![("DIR", path.clone())],
            Self::Resize { path, size } => vec![
                ("DIR", path.clone()),
                ("size", size.as_str().to_string()),
            ],
            Self::ConnectMode | Self::CameraInfo | Self::Image { .. } | Self::PowerOff => {
                Vec::new()
            }
        }
    }

    /// `com=` value if the command has one
    pub fn com(&self) -> Option<String> {
        self.query()
            .into_iter()
            .find(|(k, _)| *k == "com")
            .map(|(_, v)| v)
    }
}

/// A successful (status 200, matching path) camera response
#[derive(Debug, Clone, Default)]
pub struct CommandResponse {
    pub body: Vec<u8>,
}

impl CommandResponse {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }

    /// Body as text (lossy; the camera uses plain ASCII/XML)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

/// HTTP control plane seam
///
/// Implementations must turn transport failures into `Error::Http` (or `Error::Io`)
/// and non-200 or redirected answers into `Error::Protocol`/`Error::UnexpectedPath`.
#[async_trait]
pub trait ControlTransport: Send + Sync {
    async fn execute(&self, command: &CameraCommand) -> crate::Result<CommandResponse>;
}

//! Shared models and types for the OI.Share driver
//!
//! This module contains types shared across multiple modules
//! to avoid circular dependencies.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Camera operating mode as tracked by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    /// Still capture, driven by the two-phase shutter
    Shutter,
    /// Playback / file access
    Play,
    /// "rec" mode with the UDP preview stream available
    LiveView,
    /// Never switched since the session was created
    #[default]
    Unknown,
}

impl CameraMode {
    /// Value of the `mode` query parameter on switch_cammode.cgi
    pub fn wire_name(&self) -> Option<&'static str> {
        match self {
            Self::Shutter => Some("shutter"),
            Self::Play => Some("play"),
            Self::LiveView => Some("rec"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for CameraMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Shutter => "shutter",
            Self::Play => "play",
            Self::LiveView => "liveview",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Live view (rec mode) preview resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LiveViewQuality {
    #[serde(rename = "0320x0240")]
    Q320x240,
    #[default]
    #[serde(rename = "0640x0480")]
    Q640x480,
    #[serde(rename = "0800x0600")]
    Q800x600,
    #[serde(rename = "1024x0768")]
    Q1024x768,
    #[serde(rename = "1280x0960")]
    Q1280x960,
}

impl LiveViewQuality {
    /// Value of the `lvqty` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Q320x240 => "0320x0240",
            Self::Q640x480 => "0640x0480",
            Self::Q800x600 => "0800x0600",
            Self::Q1024x768 => "1024x0768",
            Self::Q1280x960 => "1280x0960",
        }
    }
}

impl FromStr for LiveViewQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "320" | "320x240" | "0320x0240" => Ok(Self::Q320x240),
            "640" | "640x480" | "0640x0480" => Ok(Self::Q640x480),
            "800" | "800x600" | "0800x0600" => Ok(Self::Q800x600),
            "1024" | "1024x768" | "1024x0768" => Ok(Self::Q1024x768),
            "1280" | "1280x960" | "1280x0960" => Ok(Self::Q1280x960),
            other => Err(Error::Parse(format!("unknown live view quality: {}", other))),
        }
    }
}

/// Long edge for get_resizeimg.cgi
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeSize {
    R1024,
    R1600,
    R1920,
    R2048,
}

impl ResizeSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::R1024 => "1024",
            Self::R1600 => "1600",
            Self::R1920 => "1920",
            Self::R2048 => "2048",
        }
    }
}

impl FromStr for ResizeSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1024" => Ok(Self::R1024),
            "1600" => Ok(Self::R1600),
            "1920" => Ok(Self::R1920),
            "2048" => Ok(Self::R2048),
            other => Err(Error::Parse(format!(
                "unsupported resize size {} (expected 1024, 1600, 1920 or 2048)",
                other
            ))),
        }
    }
}

/// One entry of get_imglist.cgi
///
/// The camera answers with `directory,filename,size,attribute,date,time`
/// lines; date and time are the FAT-encoded integers, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub directory: String,
    pub filename: String,
    pub size: u64,
    pub attribute: String,
    pub date: String,
    pub time: String,
}

impl ImageEntry {
    /// Parse a single CSV line; `None` for headers and malformed rows
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim().split(',').collect();
        if fields.len() != 6 {
            return None;
        }

        Some(Self {
            directory: fields[0].to_string(),
            filename: fields[1].to_string(),
            size: fields[2].trim().parse().ok()?,
            attribute: fields[3].to_string(),
            date: fields[4].to_string(),
            time: fields[5].to_string(),
        })
    }

    /// Parse the whole get_imglist.cgi body
    pub fn parse_list(body: &str) -> Vec<Self> {
        body.lines().filter_map(Self::parse_line).collect()
    }

    /// Camera-side path, as used by the DIR parameter
    pub fn path(&self) -> String {
        format!("{}/{}", self.directory, self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(CameraMode::Play.wire_name(), Some("play"));
        assert_eq!(CameraMode::Shutter.wire_name(), Some("shutter"));
        assert_eq!(CameraMode::LiveView.wire_name(), Some("rec"));
        assert_eq!(CameraMode::Unknown.wire_name(), None);
        assert_eq!(CameraMode::default(), CameraMode::Unknown);
    }

    #[test]
    fn test_quality_encoding() {
        assert_eq!(LiveViewQuality::default().as_str(), "0640x0480");
        assert_eq!(LiveViewQuality::Q1024x768.as_str(), "1024x0768");
        assert_eq!(
            "800x600".parse::<LiveViewQuality>().unwrap(),
            LiveViewQuality::Q800x600
        );
        assert!("640x640".parse::<LiveViewQuality>().is_err());
    }

    #[test]
    fn test_resize_size_parse() {
        assert_eq!("1920".parse::<ResizeSize>().unwrap(), ResizeSize::R1920);
        assert!("1000".parse::<ResizeSize>().is_err());
    }

    #[test]
    fn test_image_list_parsing() {
        let body = "VER_100\r\n\
                    /DCIM/100OLYMP,P5100027.JPG,5242880,0,19626,34271\r\n\
                    /DCIM/100OLYMP,P5100028.ORF,17000000,0,19626,34290\r\n\
                    broken,row\r\n\
                    /DCIM/100OLYMP,BAD.JPG,notanumber,0,1,2\r\n";

        let entries = ImageEntry::parse_list(body);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].filename, "P5100027.JPG");
        assert_eq!(entries[0].size, 5_242_880);
        assert_eq!(entries[1].path(), "/DCIM/100OLYMP/P5100028.ORF");
    }
}

//! FrameReassembler - JPEG frames from live view datagrams
//!
//! The camera streams each preview JPEG as a run of UDP datagrams, every one
//! carrying a 12-byte header. The first header byte(s) mark the datagram's
//! role in the frame:
//!
//! | bytes       | role   |
//! |-------------|--------|
//! | `90 ..`     | start  |
//! | `80 60`     | middle |
//! | `80 xx`     | end    |
//!
//! Nothing else in the header is interpreted. Reassembly is best-effort: a
//! lost or reordered datagram ruins at most the current frame, and the next
//! start datagram resets the state.

use chrono::{DateTime, Utc};

/// Fixed header length in front of every payload
pub const HEADER_LEN: usize = 12;

/// Receive buffer size; the camera never sends larger datagrams
pub const MAX_DATAGRAM_LEN: usize = 4000;

pub const SOI: [u8; 2] = [0xFF, 0xD8];
pub const EOI: [u8; 2] = [0xFF, 0xD9];

const MARKER_START: u8 = 0x90;
const MARKER_CONTINUATION: u8 = 0x80;
const MARKER_MIDDLE: u8 = 0x60;

/// Role of a datagram within a frame cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatagramRole {
    Start,
    Middle,
    End,
    Other,
}

impl DatagramRole {
    /// Classify by the leading marker bytes
    ///
    /// Only the marker bytes are looked at, so a datagram truncated inside
    /// its header still keeps its role.
    pub fn classify(datagram: &[u8]) -> Self {
        match (datagram.first(), datagram.get(1)) {
            (Some(&MARKER_START), _) => Self::Start,
            (Some(&MARKER_CONTINUATION), Some(&MARKER_MIDDLE)) => Self::Middle,
            (Some(&MARKER_CONTINUATION), Some(_)) => Self::End,
            _ => Self::Other,
        }
    }
}

/// A complete JPEG image (SOI .. EOI)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    completed_at: DateTime<Utc>,
}

impl Frame {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            completed_at: Utc::now(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Time the end datagram completed this frame
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Minimal sanity check: starts with SOI
    pub fn has_soi(&self) -> bool {
        self.data.starts_with(&SOI)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Find a two-byte marker in `datagram` past the header
fn find_marker(datagram: &[u8], marker: [u8; 2]) -> Option<usize> {
    datagram
        .get(HEADER_LEN..)?
        .windows(2)
        .position(|w| w == marker)
        .map(|pos| pos + HEADER_LEN)
}

/// Per-session reassembly state
#[derive(Debug, Default)]
pub struct FrameReassembler {
    /// In-progress frame; `None` between cycles
    buffer: Option<Vec<u8>>,
}

impl FrameReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes accumulated for the frame in progress
    pub fn buffered_len(&self) -> usize {
        self.buffer.as_ref().map_or(0, Vec::len)
    }

    /// Feed one datagram; returns a frame when an end datagram completes one
    pub fn consume(&mut self, datagram: &[u8]) -> Option<Frame> {
        match DatagramRole::classify(datagram) {
            DatagramRole::Start => {
                // last start wins: any unfinished frame is dropped
                let mut buffer = Vec::with_capacity(MAX_DATAGRAM_LEN * 16);
                if let Some(soi) = find_marker(datagram, SOI) {
                    buffer.extend_from_slice(&datagram[soi..]);
                } else {
                    tracing::trace!("Start datagram without SOI marker");
                }
                self.buffer = Some(buffer);
                None
            }
            DatagramRole::Middle => {
                self.buffer
                    .get_or_insert_with(Vec::new)
                    .extend_from_slice(datagram.get(HEADER_LEN..).unwrap_or_default());
                None
            }
            DatagramRole::End => self.finish(datagram),
            DatagramRole::Other => None,
        }
    }

    fn finish(&mut self, datagram: &[u8]) -> Option<Frame> {
        let mut buffer = self.buffer.take().unwrap_or_default();

        let Some(eoi) = find_marker(datagram, EOI) else {
            tracing::trace!(buffered = buffer.len(), "End datagram without EOI marker");
            return None;
        };

        let end = (eoi + EOI.len()).min(datagram.len());
        buffer.extend_from_slice(&datagram[HEADER_LEN..end]);

        if buffer.starts_with(&SOI) {
            Some(Frame::new(buffer))
        } else {
            tracing::trace!(bytes = buffer.len(), "Discarding frame without SOI");
            None
        }
    }
}

//! CameraClient - OI.Share HTTP control plane
//!
//! ## Responsibilities
//!
//! - Declarative command table (path + query per command)
//! - reqwest transport with status / path validation
//! - `ControlTransport` seam for the state machines

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{CameraClient, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use types::*;

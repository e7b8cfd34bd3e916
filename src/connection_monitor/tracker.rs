//! Connection Status Tracker
//!
//! Tracks control-endpoint reachability and detects lost/recovered events.
//! Only transitions are logged to avoid spamming the log every tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Camera connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConnectionStatus {
    /// Initial state (never probed)
    #[default]
    Unknown,
    /// Camera is answering on the control endpoint
    Online,
    /// Camera is not responding
    Offline,
}

/// Status transition event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Camera went from Online (or Unknown) to Offline
    Lost,
    /// Camera went from Offline to Online
    Recovered,
}

/// Snapshot of the tracked state
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionSnapshot {
    pub status: ConnectionStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_online_at: Option<DateTime<Utc>>,
    /// Body of the last successful get_connectmode.cgi
    pub connect_mode: Option<String>,
    pub consecutive_failures: u32,
}

/// Tracks connection status and detects transitions
#[derive(Default)]
pub struct ConnectionStatusTracker {
    state: RwLock<ConnectionSnapshot>,
}

impl ConnectionStatusTracker {
    /// Create new tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful probe
    pub async fn record_online(&self, connect_mode: Option<String>) -> Option<ConnectionEvent> {
        let now = Utc::now();
        let mut state = self.state.write().await;
        let prev = state.status;

        state.status = ConnectionStatus::Online;
        state.last_checked_at = Some(now);
        state.last_online_at = Some(now);
        state.consecutive_failures = 0;
        if connect_mode.is_some() {
            state.connect_mode = connect_mode;
        }

        match prev {
            ConnectionStatus::Offline => {
                tracing::info!("Camera connection recovered");
                Some(ConnectionEvent::Recovered)
            }
            // Unknown -> Online: first successful probe, no event
            _ => None,
        }
    }

    /// Record a failed probe
    pub async fn record_offline(&self, error: &str) -> Option<ConnectionEvent> {
        let mut state = self.state.write().await;
        let prev = state.status;

        state.status = ConnectionStatus::Offline;
        state.last_checked_at = Some(Utc::now());
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);

        match prev {
            ConnectionStatus::Online => {
                tracing::warn!(error = %error, "Camera connection lost");
                Some(ConnectionEvent::Lost)
            }
            ConnectionStatus::Unknown => {
                tracing::warn!(error = %error, "Camera initial probe failed - marking as lost");
                Some(ConnectionEvent::Lost)
            }
            ConnectionStatus::Offline => {
                tracing::debug!(
                    error = %error,
                    failures = state.consecutive_failures,
                    "Camera still unreachable"
                );
                None
            }
        }
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.state.read().await.status
    }

    pub async fn snapshot(&self) -> ConnectionSnapshot {
        self.state.read().await.clone()
    }
}

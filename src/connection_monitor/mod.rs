//! ConnectionMonitor - periodic control-endpoint probe
//!
//! ## Responsibilities
//!
//! - Probe get_connectmode.cgi on a fixed interval
//! - Record reachability transitions (never fatal, no reconnect logic)
//! - Stay silent while live view is streaming
//!
//! The monitor is owned by the session that started it; dropping it stops
//! the background task.

pub mod tracker;

use crate::camera_client::{CameraCommand, ControlTransport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub use tracker::{ConnectionEvent, ConnectionSnapshot, ConnectionStatus, ConnectionStatusTracker};

/// Default probe interval (ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

/// ConnectionMonitor instance
pub struct ConnectionMonitor {
    transport: Arc<dyn ControlTransport>,
    tracker: Arc<ConnectionStatusTracker>,
    task: JoinHandle<()>,
}

impl ConnectionMonitor {
    /// Start probing every `period`; skips ticks while `streaming` is set
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        transport: Arc<dyn ControlTransport>,
        streaming: Arc<AtomicBool>,
        period: Duration,
    ) -> Self {
        let tracker = Arc::new(ConnectionStatusTracker::new());

        let task = tokio::spawn(Self::run(
            transport.clone(),
            tracker.clone(),
            streaming,
            period,
        ));

        tracing::info!(interval_ms = period.as_millis() as u64, "Connection monitor started");

        Self {
            transport,
            tracker,
            task,
        }
    }

    async fn run(
        transport: Arc<dyn ControlTransport>,
        tracker: Arc<ConnectionStatusTracker>,
        streaming: Arc<AtomicBool>,
        period: Duration,
    ) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if streaming.load(Ordering::Acquire) {
                tracing::debug!("Live view active, skipping connection probe");
                continue;
            }

            probe(transport.as_ref(), &tracker).await;
        }
    }

    /// Probe immediately, regardless of streaming state
    pub async fn check_now(&self) -> ConnectionStatus {
        probe(self.transport.as_ref(), &self.tracker).await
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.tracker.status().await
    }

    pub async fn snapshot(&self) -> ConnectionSnapshot {
        self.tracker.snapshot().await
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the background task
    pub fn stop(&self) {
        if !self.task.is_finished() {
            self.task.abort();
            tracing::info!("Connection monitor stopped");
        }
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn probe(transport: &dyn ControlTransport, tracker: &ConnectionStatusTracker) -> ConnectionStatus {
    match transport.execute(&CameraCommand::ConnectMode).await {
        Ok(response) => {
            let mode = response.text().trim().to_string();
            tracker.record_online((!mode.is_empty()).then_some(mode)).await;
            ConnectionStatus::Online
        }
        Err(e) => {
            tracker.record_offline(&e.to_string()).await;
            ConnectionStatus::Offline
        }
    }
}

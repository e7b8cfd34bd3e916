//! LiveViewSession - UDP preview stream lifecycle
//!
//! ## Responsibilities
//!
//! - start/stop handshake with the camera (mode sequence + startliveview)
//! - Own the UDP socket while streaming, and only then
//! - Receive loop: datagrams -> FrameReassembler -> consumer channel
//!
//! Frames are pushed with `try_send`; a slow consumer loses frames instead of
//! stalling the socket.

use crate::camera_client::{CameraCommand, ControlTransport};
use crate::error::Result;
use crate::frame_reassembler::{Frame, FrameReassembler, MAX_DATAGRAM_LEN};
use crate::mode_controller::ModeTransitions;
use crate::models::{CameraMode, LiveViewQuality};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Default local port the camera streams to
pub const DEFAULT_UDP_PORT: u16 = 28488;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveViewState {
    Idle,
    Starting,
    Streaming,
    Stopping,
}

/// Counters shared with the receive loop
#[derive(Debug, Default)]
struct Counters {
    datagrams: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of the stream counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LiveViewStats {
    pub datagrams: u64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
}

/// Where the receive loop reads datagrams from
#[async_trait]
trait DatagramSource: Send + 'static {
    async fn recv_datagram(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
}

#[async_trait]
impl DatagramSource for UdpSocket {
    async fn recv_datagram(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.recv_from(buf).await.map(|(len, _)| len)
    }
}

/// Resources that only exist while streaming
#[derive(Default)]
struct Lifecycle {
    /// Closes the socket; taken exactly once by `stop`
    close: Option<oneshot::Sender<()>>,
    receiver: Option<JoinHandle<()>>,
}

/// LiveViewSession instance
pub struct LiveViewSession {
    transport: Arc<dyn ControlTransport>,
    modes: Arc<dyn ModeTransitions>,
    port: u16,
    quality: LiveViewQuality,
    state: RwLock<LiveViewState>,
    /// Mirrors `state == Streaming` for lock-free readers
    streaming: Arc<AtomicBool>,
    counters: Arc<Counters>,
    lifecycle: Mutex<Lifecycle>,
}

impl LiveViewSession {
    /// Create new session streaming to local `port`
    pub fn new(
        transport: Arc<dyn ControlTransport>,
        modes: Arc<dyn ModeTransitions>,
        port: u16,
    ) -> Self {
        Self {
            transport,
            modes,
            port,
            quality: LiveViewQuality::Q640x480,
            state: RwLock::new(LiveViewState::Idle),
            streaming: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Counters::default()),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Preview quality requested when entering rec mode
    pub fn with_quality(mut self, quality: LiveViewQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn state(&self) -> LiveViewState {
        *self.state.read().await
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Acquire)
    }

    /// Shared flag, true while streaming (used to pause connection polling)
    pub fn streaming_flag(&self) -> Arc<AtomicBool> {
        self.streaming.clone()
    }

    pub fn stats(&self) -> LiveViewStats {
        LiveViewStats {
            datagrams: self.counters.datagrams.load(Ordering::Relaxed),
            frames_delivered: self.counters.delivered.load(Ordering::Relaxed),
            frames_dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    async fn set_state(&self, state: LiveViewState) {
        *self.state.write().await = state;
    }

    /// Start streaming into `sink`; no-op if already streaming
    pub async fn start(&self, sink: mpsc::Sender<Frame>) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;

        if self.state().await == LiveViewState::Streaming {
            tracing::debug!("Live view already streaming");
            return Ok(());
        }

        self.set_state(LiveViewState::Starting).await;

        let socket = match self.open().await {
            Ok(socket) => socket,
            Err(e) => {
                tracing::error!(port = self.port, error = %e, "Failed to start live view");
                self.set_state(LiveViewState::Idle).await;
                return Err(e);
            }
        };

        self.launch(&mut lifecycle, socket, sink).await;

        tracing::info!(port = self.port, quality = self.quality.as_str(), "Live view started");
        Ok(())
    }

    /// Spawn the receive loop over `source` and enter Streaming
    async fn launch<S: DatagramSource>(
        &self,
        lifecycle: &mut Lifecycle,
        source: S,
        sink: mpsc::Sender<Frame>,
    ) {
        let (close_tx, close_rx) = oneshot::channel();
        self.streaming.store(true, Ordering::Release);

        let handle = tokio::spawn(receive_loop(
            source,
            close_rx,
            sink,
            self.streaming.clone(),
            self.counters.clone(),
        ));

        lifecycle.close = Some(close_tx);
        lifecycle.receiver = Some(handle);
        self.set_state(LiveViewState::Streaming).await;
    }

    /// Mode sequence, startliveview, bind
    async fn open(&self) -> Result<UdpSocket> {
        // firmware requires play -> rec, in this order
        self.modes.switch_to(CameraMode::Play, None).await?;
        self.modes
            .switch_to(CameraMode::LiveView, Some(self.quality))
            .await?;

        self.transport
            .execute(&CameraCommand::StartLiveView { port: self.port })
            .await?;

        let socket = UdpSocket::bind(("0.0.0.0", self.port)).await?;
        tracing::debug!(port = self.port, "UDP listener bound");

        Ok(socket)
    }

    /// Stop streaming; no-op unless streaming
    ///
    /// The socket is closed even when the camera rejects stopliveview.
    pub async fn stop(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;

        if self.state().await != LiveViewState::Streaming {
            return Ok(());
        }

        self.set_state(LiveViewState::Stopping).await;
        tracing::info!(port = self.port, "Stopping live view");

        let result = self
            .transport
            .execute(&CameraCommand::StopLiveView)
            .await
            .map(|_| ());

        if let Some(close) = lifecycle.close.take() {
            // receiver already gone if the loop died on a socket error
            let _ = close.send(());
        }
        self.streaming.store(false, Ordering::Release);

        if let Some(handle) = lifecycle.receiver.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Live view receive task ended abnormally");
            }
        }

        self.set_state(LiveViewState::Idle).await;

        if let Err(ref e) = result {
            tracing::warn!(error = %e, "Camera rejected stopliveview");
        }
        result
    }
}

impl Drop for LiveViewSession {
    fn drop(&mut self) {
        if let Some(close) = self.lifecycle.get_mut().close.take() {
            let _ = close.send(());
        }
    }
}

async fn receive_loop<S: DatagramSource>(
    mut source: S,
    mut close: oneshot::Receiver<()>,
    sink: mpsc::Sender<Frame>,
    streaming: Arc<AtomicBool>,
    counters: Arc<Counters>,
) {
    let mut reassembler = FrameReassembler::new();
    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];

    while streaming.load(Ordering::Acquire) {
        tokio::select! {
            biased;

            _ = &mut close => {
                tracing::debug!("Live view socket closed");
                break;
            }
            received = source.recv_datagram(&mut buf) => {
                let len = match received {
                    Ok(len) => len,
                    Err(e) => {
                        tracing::error!(error = %e, "Live view receive failed, stopping loop");
                        break;
                    }
                };

                counters.datagrams.fetch_add(1, Ordering::Relaxed);

                let Some(frame) = reassembler.consume(&buf[..len]) else {
                    continue;
                };
                if !frame.has_soi() {
                    continue;
                }

                match sink.try_send(frame) {
                    Ok(()) => {
                        counters.delivered.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Full(_)) => {
                        counters.dropped.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!("Frame queue full, dropping frame");
                    }
                    Err(TrySendError::Closed(_)) => {
                        counters.dropped.fetch_add(1, Ordering::Relaxed);
                        tracing::trace!("Frame consumer gone, dropping frame");
                    }
                }
            }
        }
    }

    drop(source);
    tracing::debug!("Live view receive loop exited");
}

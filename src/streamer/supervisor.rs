use super::config::StreamerConfig;
use crate::media::{AudioSource, MediaSource, VideoSource};
use crate::platform::{RoomConnector, RoomSession};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Where the supervisor is in its connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Connecting,
    Connected,
}

/// Builds the capture sources for one connection attempt
pub trait SourceProvider: Send + Sync {
    fn video(&self) -> Result<MediaSource>;
    fn audio(&self) -> Result<MediaSource>;
}

/// RTSP camera plus PulseAudio microphone
#[derive(Debug, Clone)]
pub struct CaptureSources {
    rtsp_url: String,
    mic_device: String,
}

impl CaptureSources {
    pub fn new(config: &StreamerConfig) -> Self {
        Self {
            rtsp_url: config.rtsp_url.clone(),
            mic_device: config.mic_device.clone(),
        }
    }
}

impl SourceProvider for CaptureSources {
    fn video(&self) -> Result<MediaSource> {
        Ok(MediaSource::Video(VideoSource::rtsp(&self.rtsp_url)?))
    }

    fn audio(&self) -> Result<MediaSource> {
        Ok(MediaSource::Audio(AudioSource::microphone(&self.mic_device)?))
    }
}

/// Keeps one room session alive, forever.
///
/// Every iteration builds fresh sources, connects, publishes video then
/// audio, and polls the session until it fails. Any failure disconnects the
/// session once and waits `retry_delay` before the next attempt. There is no
/// backoff and no attempt limit; only the shutdown signal ends the loop.
pub struct Supervisor {
    config: StreamerConfig,
    connector: Arc<dyn RoomConnector>,
    sources: Arc<dyn SourceProvider>,
    shutdown: watch::Receiver<bool>,
    state: watch::Sender<SupervisorState>,
    attempts: u64,
}

impl Supervisor {
    pub fn new(
        config: StreamerConfig,
        connector: Arc<dyn RoomConnector>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let sources = Arc::new(CaptureSources::new(&config));
        let (state, _) = watch::channel(SupervisorState::Idle);

        Self {
            config,
            connector,
            sources,
            shutdown,
            state,
            attempts: 0,
        }
    }

    /// Replace the capture sources
    pub fn with_sources(mut self, sources: Arc<dyn SourceProvider>) -> Self {
        self.sources = sources;
        self
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Run until shutdown is signalled. Returns the number of connection
    /// attempts made.
    pub async fn run(mut self) -> u64 {
        let identity = self.config.identity();
        info!(
            "Streaming into room {} as {}",
            self.config.room_name, identity
        );

        while !self.stop_requested() {
            self.attempts += 1;

            let mut session = None;
            let outcome = self.attempt(&identity, &mut session).await;
            if let Err(e) = &outcome {
                error!("Connection error: {:#}", e);
            }

            self.teardown(session).await;
            self.set_state(SupervisorState::Idle);

            if outcome.is_ok() || self.stop_requested() {
                break;
            }

            info!(
                "Waiting {} seconds before reconnecting...",
                self.config.retry_delay.as_secs()
            );
            if self.pause(self.config.retry_delay).await {
                break;
            }
        }

        info!("Streamer stopped after {} connection attempt(s)", self.attempts);
        self.attempts
    }

    /// One Idle → Connecting → Connected pass. Returns `Ok` only when
    /// shutdown was requested while connected.
    async fn attempt(
        &mut self,
        identity: &str,
        slot: &mut Option<Box<dyn RoomSession>>,
    ) -> Result<()> {
        let room = self.config.room_name.clone();
        self.set_state(SupervisorState::Connecting);
        info!("Connection attempt {} to room {}", self.attempts, room);

        let video = self.sources.video().context("Failed to set up video source")?;
        let audio = self.sources.audio().context("Failed to set up audio source")?;

        let session = slot.insert(
            self.connector
                .connect(&room, identity)
                .await
                .context("Failed to connect to room")?,
        );
        info!("Connected to room: {}", room);

        session
            .publish_track(&video)
            .await
            .context("Failed to publish video track")?;
        session
            .publish_track(&audio)
            .await
            .context("Failed to publish audio track")?;
        info!("Publishing tracks...");

        self.set_state(SupervisorState::Connected);

        loop {
            session.ready().await.context("Room connection lost")?;
            if self.pause(self.config.liveness_interval).await {
                return Ok(());
            }
        }
    }

    async fn teardown(&self, session: Option<Box<dyn RoomSession>>) {
        // Connect never succeeded: nothing to disconnect
        let Some(mut session) = session else {
            return;
        };

        match session.disconnect().await {
            Ok(()) => info!("Disconnected from room"),
            Err(e) => warn!("Error while disconnecting: {}", e),
        }
    }

    /// Sleep for `duration`. Returns true if shutdown was requested.
    async fn pause(&mut self, duration: Duration) -> bool {
        if self.stop_requested() {
            return true;
        }

        let shutdown = &mut self.shutdown;
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = async {
                // A dropped sender can never ask us to stop
                let signalled = shutdown.wait_for(|stop| *stop).await.is_ok();
                if !signalled {
                    std::future::pending::<()>().await;
                }
            } => true,
        }
    }

    fn stop_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn set_state(&self, state: SupervisorState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("Supervisor {:?} -> {:?}", previous, state);
        }
    }
}

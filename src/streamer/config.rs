use crate::config::Config;
use anyhow::{Context, Result};
use std::time::Duration;

/// Configuration for the streaming client
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    /// Room to publish into (e.g., "math101")
    pub room_name: String,

    /// Camera feed
    pub rtsp_url: String,

    /// PulseAudio capture device
    pub mic_device: String,

    /// Pause between a failure and the next connection attempt
    /// Default: 5 seconds
    pub retry_delay: Duration,

    /// How often a live connection is checked
    /// Default: 1 second
    pub liveness_interval: Duration,
}

impl StreamerConfig {
    pub fn new(room_name: impl Into<String>, rtsp_url: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            rtsp_url: rtsp_url.into(),
            mic_device: "default".to_string(),
            retry_delay: Duration::from_secs(5),
            liveness_interval: Duration::from_secs(1),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let room_name = cfg
            .room_name
            .clone()
            .filter(|r| !r.trim().is_empty())
            .context("ROOM_NAME is not set")?;
        let rtsp_url = cfg
            .rtsp_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .context("RTSP_URL is not set")?;

        Ok(Self {
            mic_device: cfg.mic_device.clone(),
            ..Self::new(room_name, rtsp_url)
        })
    }

    /// Participant identity the streamer joins under
    pub fn identity(&self) -> String {
        format!("streamer_{}", self.room_name)
    }
}

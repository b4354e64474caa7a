use anyhow::{bail, Result};
use std::time::Duration;

/// How long the RTSP input may stall before the camera source gives up
/// and reconnects.
pub const RTSP_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Microphone processing: non-local-means denoise plus low-latency flags
pub const NOISE_SUPPRESSION_ARGS: [&str; 6] = [
    "-af",
    "anlmdn=s=0.001:p=0.95:r=0.9",
    "-flags",
    "low_delay",
    "-fflags",
    "nobuffer",
];

/// ffmpeg option carrying the RTSP socket timeout.
///
/// ffmpeg 4.x calls it `-stimeout`; there `-timeout` is the listen timeout
/// and turns the input into an RTSP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RtspTimeoutOption {
    Stimeout,
    #[default]
    Timeout,
}

impl RtspTimeoutOption {
    pub fn for_major_version(major: u32) -> Self {
        if major < 5 {
            RtspTimeoutOption::Stimeout
        } else {
            RtspTimeoutOption::Timeout
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            RtspTimeoutOption::Stimeout => "-stimeout",
            RtspTimeoutOption::Timeout => "-timeout",
        }
    }
}

/// Track type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Camera feed pulled over RTSP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSource {
    pub url: String,
    pub reconnect_interval: Duration,
}

impl VideoSource {
    pub fn rtsp(url: &str) -> Result<Self> {
        let url = url.trim();
        if !(url.starts_with("rtsp://") || url.starts_with("rtsps://")) {
            bail!("Not an RTSP URL: {:?}", url);
        }

        Ok(Self {
            url: url.to_string(),
            reconnect_interval: RTSP_RECONNECT_INTERVAL,
        })
    }

    pub(crate) fn input_args(&self, timeout: RtspTimeoutOption) -> Vec<String> {
        vec![
            "-rtsp_transport".into(),
            "tcp".into(),
            // Microseconds under either name
            timeout.flag().into(),
            self.reconnect_interval.as_micros().to_string(),
            "-i".into(),
            self.url.clone(),
        ]
    }
}

/// Microphone captured from a PulseAudio device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    pub device: String,
    /// Extra ffmpeg options, passed through untouched
    pub extra_args: Vec<String>,
}

impl AudioSource {
    pub fn microphone(device: &str) -> Result<Self> {
        let device = device.trim();
        if device.is_empty() {
            bail!("Microphone device name is empty");
        }

        Ok(Self {
            device: device.to_string(),
            extra_args: NOISE_SUPPRESSION_ARGS.iter().map(|a| a.to_string()).collect(),
        })
    }

    pub(crate) fn input_args(&self) -> Vec<String> {
        vec!["-f".into(), "pulse".into(), "-i".into(), self.device.clone()]
    }
}

/// A capture source that can be published as one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Video(VideoSource),
    Audio(AudioSource),
}

impl MediaSource {
    pub fn kind(&self) -> TrackKind {
        match self {
            MediaSource::Video(_) => TrackKind::Video,
            MediaSource::Audio(_) => TrackKind::Audio,
        }
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            MediaSource::Video(v) => format!("video {}", v.url),
            MediaSource::Audio(a) => format!("audio {}", a.device),
        }
    }
}

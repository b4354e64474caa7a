use super::source::{MediaSource, RtspTimeoutOption};
use crate::platform::PlatformError;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Command line for an ffmpeg process pushing sources to an RTMP endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PusherArgs(Vec<String>);

impl PusherArgs {
    pub fn new(sources: &[MediaSource], target: &str, rtsp_timeout: RtspTimeoutOption) -> Self {
        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-loglevel", "warning"]
            .iter()
            .map(|a| a.to_string())
            .collect();

        for source in sources {
            match source {
                MediaSource::Video(v) => args.extend(v.input_args(rtsp_timeout)),
                MediaSource::Audio(a) => args.extend(a.input_args()),
            }
        }

        // Each source contributes exactly one input, in order
        let mut has_video = false;
        let mut has_audio = false;
        for (index, source) in sources.iter().enumerate() {
            let stream = match source {
                MediaSource::Video(_) => {
                    has_video = true;
                    "v"
                }
                MediaSource::Audio(_) => {
                    has_audio = true;
                    "a"
                }
            };
            args.push("-map".into());
            args.push(format!("{}:{}:0", index, stream));
        }

        if has_video {
            args.extend(
                [
                    "-c:v",
                    "libx264",
                    "-preset",
                    "veryfast",
                    "-tune",
                    "zerolatency",
                    "-pix_fmt",
                    "yuv420p",
                    "-g",
                    "60",
                ]
                .iter()
                .map(|a| a.to_string()),
            );
        }

        if has_audio {
            for source in sources {
                if let MediaSource::Audio(a) = source {
                    args.extend(a.extra_args.iter().cloned());
                }
            }
            args.extend(
                ["-c:a", "aac", "-ar", "48000", "-b:a", "128k"]
                    .iter()
                    .map(|a| a.to_string()),
            );
        }

        args.push("-f".into());
        args.push("flv".into());
        args.push(target.to_string());

        Self(args)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Spawns ffmpeg processes that feed an ingress endpoint
#[derive(Debug, Clone)]
pub struct FfmpegPusher {
    program: String,
    rtsp_timeout: RtspTimeoutOption,
}

impl FfmpegPusher {
    /// Pusher assuming ffmpeg 5 or later
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            rtsp_timeout: RtspTimeoutOption::default(),
        }
    }

    /// Run `program -version` once and pick option names to match it
    pub async fn detect(program: impl Into<String>) -> Self {
        let pusher = Self::new(program);

        let output = Command::new(&pusher.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;

        let major = match output {
            Ok(out) => parse_major_version(&String::from_utf8_lossy(&out.stdout)),
            Err(e) => {
                warn!("Could not run {} -version: {}", pusher.program, e);
                None
            }
        };

        match major {
            Some(major) => {
                info!("Using {} (major version {})", pusher.program, major);
                pusher.with_rtsp_timeout(RtspTimeoutOption::for_major_version(major))
            }
            None => {
                warn!("Unknown {} version; assuming 5 or later", pusher.program);
                pusher
            }
        }
    }

    pub fn with_rtsp_timeout(mut self, rtsp_timeout: RtspTimeoutOption) -> Self {
        self.rtsp_timeout = rtsp_timeout;
        self
    }

    pub fn rtsp_timeout(&self) -> RtspTimeoutOption {
        self.rtsp_timeout
    }

    pub fn spawn(&self, sources: &[MediaSource], target: &str) -> Result<Child, PlatformError> {
        let args = PusherArgs::new(sources, target, self.rtsp_timeout);
        debug!("{} {}", self.program, args.as_slice().join(" "));

        let child = Command::new(&self.program)
            .args(args.as_slice())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlatformError::Process(format!("failed to start {}: {}", self.program, e)))?;

        info!(
            "Started media pusher (pid {:?}) with {} source(s)",
            child.id(),
            sources.len()
        );

        Ok(child)
    }
}

impl Default for FfmpegPusher {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

/// Major version from the first line of `ffmpeg -version`.
///
/// Git builds (`N-...`) carry no release number and yield `None`.
pub fn parse_major_version(banner: &str) -> Option<u32> {
    let version = banner
        .lines()
        .next()?
        .strip_prefix("ffmpeg version ")?
        .split_whitespace()
        .next()?;
    let version = version.strip_prefix('n').unwrap_or(version);

    let digits: String = version.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

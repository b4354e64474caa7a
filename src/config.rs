use crate::platform::ApiCredentials;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_LIVEKIT_URL: &str = "ws://localhost:7880";
pub const DEFAULT_RECORDINGS_DIR: &str = "/mnt/recordings";
pub const DEFAULT_PORT: u16 = 5000;
/// Deployment file read from the working directory, if present
pub const DOTENV_FILE: &str = ".env";

/// Deployment settings shared by the streamer and the control server.
///
/// Every key maps one-to-one onto an upper-case environment variable
/// (`livekit_url` ← `LIVEKIT_URL`). Values come from the built-in defaults,
/// then an optional config file, then a `.env` file, then the process
/// environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub livekit_url: String,
    pub livekit_api_key: Option<String>,
    pub livekit_api_secret: Option<String>,

    /// Room the streamer publishes into
    pub room_name: Option<String>,
    /// Camera feed published by the streamer
    pub rtsp_url: Option<String>,
    /// PulseAudio capture device
    pub mic_device: String,
    pub ffmpeg_path: String,

    pub recordings_dir: PathBuf,
    pub recording_layout: String,
    /// Directory holding the classroom viewer page, served as a fallback
    pub viewer_dir: Option<PathBuf>,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load from an optional config file and `./.env`, layered under the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_dotenv(path, Path::new(DOTENV_FILE), None)
    }

    /// Load with an explicit environment map instead of the process environment.
    pub fn load_from_env(path: Option<&Path>, env: config::Map<String, String>) -> Result<Self> {
        Self::build(path, config::Map::new(), Some(env))
    }

    /// Load with a specific dotenv file. A missing file is skipped; `env`
    /// replaces the process environment when given.
    pub fn load_with_dotenv(
        path: Option<&Path>,
        dotenv: &Path,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let dotenv = read_dotenv(dotenv)?;
        Self::build(path, dotenv, env)
    }

    fn build(
        path: Option<&Path>,
        dotenv: config::Map<String, String>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("livekit_url", DEFAULT_LIVEKIT_URL)?
            .set_default("mic_device", "default")?
            .set_default("ffmpeg_path", "ffmpeg")?
            .set_default("recordings_dir", DEFAULT_RECORDINGS_DIR)?
            .set_default("recording_layout", "grid")?
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(DEFAULT_PORT))?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(config::Environment::default().source(Some(dotenv)))
            .add_source(config::Environment::default().source(env))
            .build()
            .context("Failed to read configuration")?;

        let mut cfg: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        // A blank directory would resolve against the working directory
        cfg.viewer_dir = cfg.viewer_dir.filter(|dir| !is_blank(dir));
        if is_blank(&cfg.recordings_dir) {
            cfg.recordings_dir = PathBuf::from(DEFAULT_RECORDINGS_DIR);
        }

        Ok(cfg)
    }

    /// API key and secret, if both are configured and non-empty.
    pub fn credentials(&self) -> Option<ApiCredentials> {
        let key = non_empty(self.livekit_api_key.as_deref())?;
        let secret = non_empty(self.livekit_api_secret.as_deref())?;
        Some(ApiCredentials::new(key, secret))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_blank(path: &Path) -> bool {
    path.to_str().map_or(false, |p| p.trim().is_empty())
}

fn read_dotenv(path: &Path) -> Result<config::Map<String, String>> {
    if !path.exists() {
        return Ok(config::Map::new());
    }

    let entries = dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut vars = config::Map::new();
    for entry in entries {
        let (key, value) =
            entry.with_context(|| format!("Failed to parse {}", path.display()))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

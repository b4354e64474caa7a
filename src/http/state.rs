use crate::config::Config;
use crate::platform::{
    ApiCredentials, CredentialSigner, EgressService, JwtSigner, TwirpEgressService,
};
use crate::recording::{Clock, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;

/// Read-only settings for the control handlers
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Missing when the key pair is not configured
    pub credentials: Option<ApiCredentials>,

    /// Where the platform writes recordings
    pub recordings_dir: PathBuf,

    /// Composite template for recordings
    pub layout: String,

    /// Static viewer files served as the fallback route
    pub viewer_dir: Option<PathBuf>,
}

impl ControlConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            credentials: cfg.credentials(),
            recordings_dir: cfg.recordings_dir.clone(),
            layout: cfg.recording_layout.clone(),
            viewer_dir: cfg.viewer_dir.clone(),
        }
    }
}

/// Shared application state for HTTP handlers
///
/// Holds no writable state: every request only reads the configuration and
/// calls the platform collaborators.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ControlConfig>,
    pub signer: Arc<dyn CredentialSigner>,
    pub egress: Arc<dyn EgressService>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Production wiring against the platform at `livekit_url`
    pub fn new(config: ControlConfig, livekit_url: &str) -> Self {
        Self {
            config: Arc::new(config),
            signer: Arc::new(JwtSigner::default()),
            egress: Arc::new(TwirpEgressService::new(livekit_url)),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn CredentialSigner>) -> Self {
        self.signer = signer;
        self
    }

    pub fn with_egress(mut self, egress: Arc<dyn EgressService>) -> Self {
        self.egress = egress;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

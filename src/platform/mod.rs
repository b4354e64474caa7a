//! LiveKit platform client
//!
//! Everything this crate asks of the media platform goes through here:
//! - `token` - access token claims and signing
//! - `egress` - room composite recordings
//! - `ingress` - publishing local capture sources into a room
//! - `room` - the connection traits the streamer supervises
//!
//! The control calls use LiveKit's Twirp/JSON HTTP API.

pub mod egress;
pub mod ingress;
pub mod room;
pub mod token;
mod twirp;

pub use egress::{CompositeRecording, EgressInfo, EgressService, TwirpEgressService};
pub use ingress::{IngressConnector, IngressInfo, IngressSession};
pub use room::{RoomConnector, RoomSession};
pub use token::{AccessToken, Claims, CredentialSigner, JwtSigner, VideoGrants};
pub use twirp::http_base_url;

/// API key pair used to sign every token and control request.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Errors raised by the platform client
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{method} request failed: {source}")]
    Http {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} returned {code}: {message}")]
    Status {
        method: &'static str,
        code: String,
        message: String,
    },

    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("media process error: {0}")]
    Process(String),

    #[error("room session closed: {0}")]
    Closed(String),
}

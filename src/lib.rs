pub mod config;
pub mod http;
pub mod media;
pub mod platform;
pub mod recording;
pub mod shutdown;
pub mod streamer;

pub use config::Config;
pub use http::{create_router, AppState, ControlConfig};
pub use media::{AudioSource, FfmpegPusher, MediaSource, VideoSource};
pub use platform::{
    ApiCredentials, CredentialSigner, EgressService, IngressConnector, PlatformError,
    RoomConnector, RoomSession,
};
pub use recording::{Clock, FixedClock, RecordingRequest, SystemClock};
pub use streamer::{StreamerConfig, Supervisor, SupervisorState};

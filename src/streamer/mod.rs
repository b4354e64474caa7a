//! Streaming client
//!
//! Publishes a classroom camera and microphone into one room and keeps
//! doing so for as long as the process runs:
//! - `StreamerConfig` - room, sources and timing
//! - `Supervisor` - the connect / publish / watch / retry loop
//! - `SourceProvider` - builds fresh capture sources for each attempt

mod config;
mod supervisor;

pub use config::StreamerConfig;
pub use supervisor::{CaptureSources, SourceProvider, Supervisor, SupervisorState};

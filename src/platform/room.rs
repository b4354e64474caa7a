use super::PlatformError;
use crate::media::MediaSource;
use async_trait::async_trait;

/// Opens room connections for a participant
#[async_trait]
pub trait RoomConnector: Send + Sync {
    /// Join `room` as `identity`
    async fn connect(
        &self,
        room: &str,
        identity: &str,
    ) -> Result<Box<dyn RoomSession>, PlatformError>;
}

/// A live connection to one room
#[async_trait]
pub trait RoomSession: Send {
    /// Publish `source` as a track of this participant
    async fn publish_track(&mut self, source: &MediaSource) -> Result<(), PlatformError>;

    /// Return an error once the connection or any published track has died
    async fn ready(&mut self) -> Result<(), PlatformError>;

    /// Leave the room. Safe to call more than once.
    async fn disconnect(&mut self) -> Result<(), PlatformError>;
}

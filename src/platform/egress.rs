use super::token::VideoGrants;
use super::twirp::TwirpClient;
use super::{ApiCredentials, PlatformError};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use tracing::info;

const EGRESS_SERVICE: &str = "Egress";

/// A room composite recording to a single MP4 file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeRecording {
    pub room_name: String,
    pub file_path: PathBuf,
    /// Composite template, e.g. "grid" or "speaker"
    pub layout: String,
    pub audio: bool,
    pub video: bool,
}

/// Egress job as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgressInfo {
    #[serde(alias = "egressId")]
    pub egress_id: String,

    #[serde(default, alias = "roomName")]
    pub room_name: String,

    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: String,

    #[serde(default)]
    pub error: String,
}

const EGRESS_STATUSES: [&str; 7] = [
    "EGRESS_STARTING",
    "EGRESS_ACTIVE",
    "EGRESS_ENDING",
    "EGRESS_COMPLETE",
    "EGRESS_FAILED",
    "EGRESS_ABORTED",
    "EGRESS_LIMIT_REACHED",
];

/// Status arrives as the enum name, or as its number when the server emits
/// integer enums.
fn deserialize_status<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Name(String),
        Code(i64),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Name(name) => name,
        Repr::Code(code) => usize::try_from(code)
            .ok()
            .and_then(|i| EGRESS_STATUSES.get(i))
            .map(|s| s.to_string())
            .unwrap_or_else(|| code.to_string()),
    })
}

#[derive(Debug, Serialize)]
struct EncodedFileOutput<'a> {
    file_type: &'static str,
    filepath: &'a str,
}

#[derive(Debug, Serialize)]
struct StartRoomCompositeEgressRequest<'a> {
    room_name: &'a str,
    layout: &'a str,
    audio_only: bool,
    video_only: bool,
    file_outputs: Vec<EncodedFileOutput<'a>>,
}

#[derive(Debug, Serialize)]
struct StopEgressRequest<'a> {
    egress_id: &'a str,
}

/// Recording control
#[async_trait]
pub trait EgressService: Send + Sync {
    async fn start_room_composite(
        &self,
        credentials: &ApiCredentials,
        recording: &CompositeRecording,
    ) -> Result<EgressInfo, PlatformError>;

    async fn stop_egress(
        &self,
        credentials: &ApiCredentials,
        egress_id: &str,
    ) -> Result<EgressInfo, PlatformError>;
}

/// Egress service backed by the platform's HTTP API
#[derive(Debug, Clone)]
pub struct TwirpEgressService {
    url: String,
}

impl TwirpEgressService {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn client(&self) -> TwirpClient {
        TwirpClient::new(&self.url)
    }
}

#[async_trait]
impl EgressService for TwirpEgressService {
    async fn start_room_composite(
        &self,
        credentials: &ApiCredentials,
        recording: &CompositeRecording,
    ) -> Result<EgressInfo, PlatformError> {
        let filepath = recording.file_path.to_string_lossy();
        let request = StartRoomCompositeEgressRequest {
            room_name: &recording.room_name,
            layout: &recording.layout,
            audio_only: recording.audio && !recording.video,
            video_only: recording.video && !recording.audio,
            file_outputs: vec![EncodedFileOutput {
                file_type: "MP4",
                filepath: &filepath,
            }],
        };

        let client = self.client();
        info!(
            "Requesting composite egress for room {} from {}",
            recording.room_name,
            client.base_url()
        );

        client
            .call(
                credentials,
                VideoGrants::recorder(),
                EGRESS_SERVICE,
                "StartRoomCompositeEgress",
                &request,
            )
            .await
    }

    async fn stop_egress(
        &self,
        credentials: &ApiCredentials,
        egress_id: &str,
    ) -> Result<EgressInfo, PlatformError> {
        self.client()
            .call(
                credentials,
                VideoGrants::recorder(),
                EGRESS_SERVICE,
                "StopEgress",
                &StopEgressRequest { egress_id },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_egress_info_accepts_proto_and_camel_names() {
        let proto: EgressInfo = serde_json::from_str(
            r#"{"egress_id":"EG_abc","room_name":"math101","status":"EGRESS_ACTIVE"}"#,
        )
        .unwrap();
        assert_eq!(proto.egress_id, "EG_abc");
        assert_eq!(proto.status, "EGRESS_ACTIVE");

        let camel: EgressInfo =
            serde_json::from_str(r#"{"egressId":"EG_abc","roomName":"math101"}"#).unwrap();
        assert_eq!(camel.room_name, "math101");
        assert_eq!(camel.status, "");
    }

    #[test]
    fn test_numeric_status_maps_to_name() {
        let info: EgressInfo =
            serde_json::from_str(r#"{"egress_id":"EG_abc","status":3}"#).unwrap();
        assert_eq!(info.status, "EGRESS_COMPLETE");

        let info: EgressInfo =
            serde_json::from_str(r#"{"egress_id":"EG_abc","status":42}"#).unwrap();
        assert_eq!(info.status, "42");
    }
}

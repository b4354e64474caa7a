//! Room sessions backed by an RTMP ingress
//!
//! Connecting creates an ingress endpoint bound to the room and the
//! participant identity. Published sources are muxed by one ffmpeg process
//! into that endpoint, and the platform turns the stream into the
//! participant's tracks.

use super::room::{RoomConnector, RoomSession};
use super::token::VideoGrants;
use super::twirp::TwirpClient;
use super::{ApiCredentials, PlatformError};
use crate::media::{FfmpegPusher, MediaSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Child;
use tracing::{info, warn};
use uuid::Uuid;

const INGRESS_SERVICE: &str = "Ingress";

/// Ingress endpoint as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressInfo {
    #[serde(alias = "ingressId")]
    pub ingress_id: String,

    #[serde(default)]
    pub url: String,

    #[serde(default, alias = "streamKey")]
    pub stream_key: String,

    #[serde(default, alias = "roomName")]
    pub room_name: String,

    #[serde(default, alias = "participantIdentity")]
    pub participant_identity: String,
}

impl IngressInfo {
    /// RTMP URL the pusher publishes to
    pub fn publish_url(&self) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), self.stream_key)
    }
}

#[derive(Debug, Serialize)]
struct CreateIngressRequest<'a> {
    input_type: &'static str,
    name: String,
    room_name: &'a str,
    participant_identity: &'a str,
    participant_name: &'a str,
}

#[derive(Debug, Serialize)]
struct ListIngressRequest<'a> {
    room_name: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ListIngressResponse {
    #[serde(default)]
    items: Vec<IngressInfo>,
}

#[derive(Debug, Serialize)]
struct DeleteIngressRequest<'a> {
    ingress_id: &'a str,
}

async fn delete_ingress(
    client: &TwirpClient,
    credentials: &ApiCredentials,
    ingress_id: &str,
) -> Result<(), PlatformError> {
    let _: IngressInfo = client
        .call(
            credentials,
            VideoGrants::ingress_admin(),
            INGRESS_SERVICE,
            "DeleteIngress",
            &DeleteIngressRequest { ingress_id },
        )
        .await?;
    Ok(())
}

/// Connects to rooms through RTMP ingress endpoints
#[derive(Debug, Clone)]
pub struct IngressConnector {
    client: TwirpClient,
    credentials: ApiCredentials,
    pusher: FfmpegPusher,
}

impl IngressConnector {
    pub fn new(url: &str, credentials: ApiCredentials, pusher: FfmpegPusher) -> Self {
        Self {
            client: TwirpClient::new(url),
            credentials,
            pusher,
        }
    }

    /// Delete endpoints a previous run left behind for this identity
    async fn remove_stale(&self, room: &str, identity: &str) -> Result<(), PlatformError> {
        let existing: ListIngressResponse = self
            .client
            .call(
                &self.credentials,
                VideoGrants::ingress_admin(),
                INGRESS_SERVICE,
                "ListIngress",
                &ListIngressRequest { room_name: room },
            )
            .await?;

        for stale in existing
            .items
            .iter()
            .filter(|i| i.participant_identity == identity)
        {
            warn!("Removing stale ingress {} for {}", stale.ingress_id, identity);
            delete_ingress(&self.client, &self.credentials, &stale.ingress_id).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl RoomConnector for IngressConnector {
    async fn connect(
        &self,
        room: &str,
        identity: &str,
    ) -> Result<Box<dyn RoomSession>, PlatformError> {
        self.remove_stale(room, identity).await?;

        let suffix = Uuid::new_v4().simple().to_string();
        let request = CreateIngressRequest {
            input_type: "RTMP_INPUT",
            name: format!("{}-{}", identity, &suffix[..8]),
            room_name: room,
            participant_identity: identity,
            participant_name: identity,
        };

        let ingress: IngressInfo = self
            .client
            .call(
                &self.credentials,
                VideoGrants::ingress_admin(),
                INGRESS_SERVICE,
                "CreateIngress",
                &request,
            )
            .await?;

        info!(
            "Created ingress {} for {} in room {}",
            ingress.ingress_id, identity, room
        );

        Ok(Box::new(IngressSession {
            client: self.client.clone(),
            credentials: self.credentials.clone(),
            pusher: self.pusher.clone(),
            ingress: Some(ingress),
            tracks: Vec::new(),
            process: None,
        }))
    }
}

/// One connection to a room through an ingress endpoint
pub struct IngressSession {
    client: TwirpClient,
    credentials: ApiCredentials,
    pusher: FfmpegPusher,
    ingress: Option<IngressInfo>,
    tracks: Vec<MediaSource>,
    process: Option<Child>,
}

impl IngressSession {
    pub fn ingress(&self) -> Option<&IngressInfo> {
        self.ingress.as_ref()
    }

    pub fn tracks(&self) -> &[MediaSource] {
        &self.tracks
    }

    async fn stop_process(&mut self) {
        if let Some(mut child) = self.process.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop media pusher: {}", e);
            }
        }
    }
}

#[async_trait]
impl RoomSession for IngressSession {
    async fn publish_track(&mut self, source: &MediaSource) -> Result<(), PlatformError> {
        let target = match &self.ingress {
            Some(ingress) => ingress.publish_url(),
            None => return Err(PlatformError::Closed("not connected".into())),
        };

        // The ingress takes one muxed stream, so the pusher restarts with
        // the full track set
        self.tracks.retain(|t| t.kind() != source.kind());
        self.tracks.push(source.clone());
        self.stop_process().await;
        self.process = Some(self.pusher.spawn(&self.tracks, &target)?);

        info!("Published {}", source.describe());
        Ok(())
    }

    async fn ready(&mut self) -> Result<(), PlatformError> {
        if self.ingress.is_none() {
            return Err(PlatformError::Closed("not connected".into()));
        }

        if let Some(child) = self.process.as_mut() {
            match child.try_wait() {
                Ok(None) => {}
                Ok(Some(status)) => {
                    self.process = None;
                    return Err(PlatformError::Closed(format!(
                        "media pusher exited with {}",
                        status
                    )));
                }
                Err(e) => return Err(PlatformError::Process(e.to_string())),
            }
        }

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), PlatformError> {
        self.stop_process().await;
        self.tracks.clear();

        if let Some(ingress) = self.ingress.take() {
            delete_ingress(&self.client, &self.credentials, &ingress.ingress_id).await?;
            info!("Deleted ingress {}", ingress.ingress_id);
        }

        Ok(())
    }
}

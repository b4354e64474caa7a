use super::error::ApiError;
use super::state::AppState;
use crate::platform::{ApiCredentials, VideoGrants};
use crate::recording::{is_safe_room_name, RecordingRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub room_name: Option<String>,
    pub identity: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingRequest {
    pub room_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingResponse {
    pub egress_id: String,
    pub status: String,
    pub file_path: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRecordingRequest {
    pub egress_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopRecordingResponse {
    pub status: String,
    pub message: String,
}

// ============================================================================
// Helpers
// ============================================================================

/// A body that is absent or not the expected JSON counts as empty, so the
/// caller gets the usual missing-field error.
fn payload<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(value)) => value,
        Err(rejection) => {
            debug!("Unusable request body: {}", rejection);
            T::default()
        }
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn credentials(state: &AppState) -> Result<&ApiCredentials, ApiError> {
    state.config.credentials.as_ref().ok_or_else(|| {
        error!("LIVEKIT_API_KEY / LIVEKIT_API_SECRET not configured");
        ApiError::Configuration
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /token
/// Issue a join token for a room
pub async fn issue_token(
    State(state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let credentials = credentials(&state)?;

    let req = payload(body);
    let (Some(room_name), Some(identity)) = (required(req.room_name), required(req.identity))
    else {
        return Err(ApiError::Validation("Missing roomName or identity"));
    };

    let token = state
        .signer
        .issue(credentials, &identity, VideoGrants::join(room_name.as_str()))
        .map_err(|e| {
            error!("Failed to sign token for {}: {}", identity, e);
            ApiError::Signing(e)
        })?;

    info!("Issued token for {} in room {}", identity, room_name);

    Ok(Json(TokenResponse { token }))
}

/// POST /start-recording
/// Start a composite recording of a room
pub async fn start_recording(
    State(state): State<AppState>,
    body: Result<Json<StartRecordingRequest>, JsonRejection>,
) -> Result<Json<StartRecordingResponse>, ApiError> {
    let req = payload(body);
    let room_name = required(req.room_name).ok_or(ApiError::Validation("Missing roomName"))?;
    if !is_safe_room_name(&room_name) {
        return Err(ApiError::Validation("Invalid roomName"));
    }

    let credentials = credentials(&state)?;

    let request = RecordingRequest::new(&state.config.recordings_dir, &room_name, state.clock.now());
    info!(
        "Starting recording of room {} to {}",
        room_name,
        request.file_path.display()
    );

    let egress = state
        .egress
        .start_room_composite(credentials, &request.composite(&state.config.layout))
        .await
        .map_err(|source| {
            error!("Failed to start recording: {}", source);
            ApiError::Platform {
                action: "start recording",
                source,
            }
        })?;

    info!("Recording {} started ({})", egress.egress_id, egress.status);

    Ok(Json(StartRecordingResponse {
        egress_id: egress.egress_id,
        status: egress.status,
        file_path: request.file_path.to_string_lossy().into_owned(),
    }))
}

/// POST /stop-recording
/// Stop a recording by egress ID
pub async fn stop_recording(
    State(state): State<AppState>,
    body: Result<Json<StopRecordingRequest>, JsonRejection>,
) -> Result<Json<StopRecordingResponse>, ApiError> {
    let req = payload(body);
    let egress_id = required(req.egress_id).ok_or(ApiError::Validation("Missing egressId"))?;

    let credentials = credentials(&state)?;

    info!("Stopping recording {}", egress_id);

    let egress = state
        .egress
        .stop_egress(credentials, &egress_id)
        .await
        .map_err(|source| {
            error!("Failed to stop recording {}: {}", egress_id, source);
            ApiError::Platform {
                action: "stop recording",
                source,
            }
        })?;

    Ok(Json(StopRecordingResponse {
        status: egress.status,
        message: "Recording stopped successfully".to_string(),
    }))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

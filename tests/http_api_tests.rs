// Integration tests for the HTTP control API
//
// Requests go through the full router in-process. The signer and the
// egress service are replaced with counting doubles so the tests can check
// which requests reach the platform.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, NaiveDateTime};
use classroom_stream::platform::token::verify;
use classroom_stream::platform::{
    CompositeRecording, CredentialSigner, EgressInfo, EgressService, JwtSigner, VideoGrants,
};
use classroom_stream::{
    create_router, ApiCredentials, AppState, Config, ControlConfig, FixedClock, PlatformError,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

fn creds() -> ApiCredentials {
    ApiCredentials::new("APIclassroom", "classroom-test-secret")
}

fn new_year() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// Signs real tokens and counts calls
#[derive(Default)]
struct CountingSigner {
    calls: AtomicUsize,
}

impl CredentialSigner for CountingSigner {
    fn issue(
        &self,
        credentials: &ApiCredentials,
        identity: &str,
        grants: VideoGrants,
    ) -> Result<String, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        JwtSigner::default().issue(credentials, identity, grants)
    }
}

struct FailingSigner;

impl CredentialSigner for FailingSigner {
    fn issue(&self, _: &ApiCredentials, _: &str, _: VideoGrants) -> Result<String, PlatformError> {
        Err(PlatformError::Process("signer unavailable".into()))
    }
}

/// Records every egress call
#[derive(Default)]
struct FakeEgress {
    fail: bool,
    started: Mutex<Vec<CompositeRecording>>,
    stopped: Mutex<Vec<String>>,
}

impl FakeEgress {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.started.lock().unwrap().len() + self.stopped.lock().unwrap().len()
    }

    fn unavailable(method: &'static str) -> PlatformError {
        PlatformError::Status {
            method,
            code: "unavailable".into(),
            message: "no egress workers".into(),
        }
    }
}

#[async_trait]
impl EgressService for FakeEgress {
    async fn start_room_composite(
        &self,
        _credentials: &ApiCredentials,
        recording: &CompositeRecording,
    ) -> Result<EgressInfo, PlatformError> {
        self.started.lock().unwrap().push(recording.clone());
        if self.fail {
            return Err(Self::unavailable("StartRoomCompositeEgress"));
        }
        Ok(EgressInfo {
            egress_id: "EG_test123".into(),
            room_name: recording.room_name.clone(),
            status: "EGRESS_STARTING".into(),
            error: String::new(),
        })
    }

    async fn stop_egress(
        &self,
        _credentials: &ApiCredentials,
        egress_id: &str,
    ) -> Result<EgressInfo, PlatformError> {
        self.stopped.lock().unwrap().push(egress_id.to_string());
        if self.fail {
            return Err(Self::unavailable("StopEgress"));
        }
        Ok(EgressInfo {
            egress_id: egress_id.to_string(),
            room_name: "math101".into(),
            status: "EGRESS_ENDING".into(),
            error: String::new(),
        })
    }
}

struct Harness {
    signer: Arc<CountingSigner>,
    egress: Arc<FakeEgress>,
    app: Router,
}

fn harness_with(credentials: Option<ApiCredentials>, egress: FakeEgress) -> Harness {
    let signer = Arc::new(CountingSigner::default());
    let egress = Arc::new(egress);

    let config = ControlConfig {
        credentials,
        recordings_dir: PathBuf::from("/mnt/recordings"),
        layout: "grid".to_string(),
        viewer_dir: None,
    };
    let state = AppState::new(config, "ws://localhost:7880")
        .with_signer(signer.clone())
        .with_egress(egress.clone())
        .with_clock(Arc::new(FixedClock(new_year())));

    Harness {
        signer,
        egress,
        app: create_router(state),
    }
}

fn harness() -> Harness {
    harness_with(Some(creds()), FakeEgress::default())
}

async fn post(app: &Router, path: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

// ============================================================================
// POST /token
// ============================================================================

#[tokio::test]
async fn test_token_grants_room_and_identity() {
    let h = harness();

    let (status, body) = post(
        &h.app,
        "/token",
        r#"{"roomName":"math101","identity":"alice"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token field");

    let claims = verify(token, &creds()).unwrap();
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.video.room, "math101");
    assert!(claims.video.room_join);
    assert!(claims.video.can_publish);
    assert!(claims.video.can_subscribe);
    assert_eq!(h.signer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_token_missing_identity_is_rejected() {
    let h = harness();

    let (status, body) = post(&h.app, "/token", r#"{"roomName":"math101"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing roomName or identity"}));
    assert_eq!(h.signer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_token_rejects_empty_and_unparseable_bodies() {
    let h = harness();

    for body in [
        "",
        "not json",
        "{}",
        r#"{"identity":"alice"}"#,
        r#"{"roomName":"","identity":"alice"}"#,
        r#"{"roomName":7,"identity":"alice"}"#,
    ] {
        let (status, response) = post(&h.app, "/token", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        assert_eq!(response["error"], "Missing roomName or identity");
    }

    assert_eq!(h.signer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_token_without_key_material_is_a_server_error() {
    let h = harness_with(None, FakeEgress::default());

    let (status, body) = post(
        &h.app,
        "/token",
        r#"{"roomName":"math101","identity":"alice"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "API key or secret not configured");
    assert_eq!(h.signer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_token_signing_failure_is_a_server_error() {
    let config = ControlConfig {
        credentials: Some(creds()),
        recordings_dir: PathBuf::from("/mnt/recordings"),
        layout: "grid".to_string(),
        viewer_dir: None,
    };
    let app = create_router(
        AppState::new(config, "ws://localhost:7880").with_signer(Arc::new(FailingSigner)),
    );

    let (status, body) = post(&app, "/token", r#"{"roomName":"math101","identity":"alice"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("signer unavailable"));
}

// ============================================================================
// POST /start-recording
// ============================================================================

#[tokio::test]
async fn test_start_recording_names_file_after_room_and_time() {
    let h = harness();

    let (status, body) = post(&h.app, "/start-recording", r#"{"roomName":"math101"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["egressId"], "EG_test123");
    assert_eq!(body["status"], "EGRESS_STARTING");
    assert_eq!(body["filePath"], "/mnt/recordings/math101-20240101_100000.mp4");

    let started = h.egress.started.lock().unwrap();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].room_name, "math101");
    assert_eq!(started[0].layout, "grid");
    assert!(started[0].audio && started[0].video);
    assert_eq!(
        started[0].file_path,
        PathBuf::from("/mnt/recordings/math101-20240101_100000.mp4")
    );
}

#[tokio::test]
async fn test_start_recording_missing_room_never_reaches_platform() {
    let h = harness();

    for body in ["{}", "", r#"{"roomName":"  "}"#] {
        let (status, response) = post(&h.app, "/start-recording", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, json!({"error": "Missing roomName"}));
    }

    assert_eq!(h.egress.calls(), 0);
}

#[tokio::test]
async fn test_start_recording_refuses_path_traversal() {
    let h = harness();

    let (status, body) = post(&h.app, "/start-recording", r#"{"roomName":"../etc"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid roomName");
    assert_eq!(h.egress.calls(), 0);
}

#[tokio::test]
async fn test_start_recording_without_key_material() {
    let h = harness_with(None, FakeEgress::default());

    let (status, body) = post(&h.app, "/start-recording", r#"{"roomName":"math101"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "API key or secret not configured");
    assert_eq!(h.egress.calls(), 0);
}

#[tokio::test]
async fn test_start_recording_platform_failure_is_wrapped() {
    let h = harness_with(Some(creds()), FakeEgress::failing());

    let (status, body) = post(&h.app, "/start-recording", r#"{"roomName":"math101"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Failed to start recording: StartRoomCompositeEgress returned unavailable: no egress workers"
    );
}

// ============================================================================
// POST /stop-recording
// ============================================================================

#[tokio::test]
async fn test_stop_recording_confirms() {
    let h = harness();

    let (status, body) = post(&h.app, "/stop-recording", r#"{"egressId":"EG_test123"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "EGRESS_ENDING", "message": "Recording stopped successfully"})
    );
    assert_eq!(*h.egress.stopped.lock().unwrap(), vec!["EG_test123".to_string()]);
}

#[tokio::test]
async fn test_stop_recording_missing_id_never_reaches_platform() {
    let h = harness();

    let (status, body) = post(&h.app, "/stop-recording", r#"{"roomName":"math101"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing egressId"}));
    assert_eq!(h.egress.calls(), 0);
}

#[tokio::test]
async fn test_stop_recording_without_key_material() {
    let h = harness_with(None, FakeEgress::default());

    let (status, body) = post(&h.app, "/stop-recording", r#"{"egressId":"EG_test123"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "API key or secret not configured"}));
    assert_eq!(h.egress.calls(), 0);
}

#[tokio::test]
async fn test_stop_recording_platform_failure_is_wrapped() {
    let h = harness_with(Some(creds()), FakeEgress::failing());

    let (status, body) = post(&h.app, "/stop-recording", r#"{"egressId":"EG_gone"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to stop recording: "));
}

// ============================================================================
// Ambient routes
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let h = harness();

    let response = h
        .app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_cross_origin_preflight_is_allowed() {
    let h = harness();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/token")
        .header(header::ORIGIN, "http://viewer.local")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = h.app.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_viewer_files_are_served_when_configured() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("index.html"), "<h1>Classrooms</h1>")?;

    let config = ControlConfig {
        credentials: Some(creds()),
        recordings_dir: PathBuf::from("/mnt/recordings"),
        layout: "grid".to_string(),
        viewer_dir: Some(dir.path().to_path_buf()),
    };
    let app = create_router(AppState::new(config, "ws://localhost:7880"));

    let response = app
        .oneshot(Request::get("/index.html").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"<h1>Classrooms</h1>");

    Ok(())
}

#[tokio::test]
async fn test_blank_viewer_dir_serves_nothing() -> anyhow::Result<()> {
    let env = [("VIEWER_DIR", ""), ("LIVEKIT_API_KEY", "devkey")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let cfg = Config::load_from_env(None, env)?;
    let from_env = ControlConfig::from_config(&cfg);
    assert!(from_env.viewer_dir.is_none());

    let built_by_hand = ControlConfig {
        viewer_dir: Some(PathBuf::new()),
        ..from_env.clone()
    };

    // Tests run from the package root, where Cargo.toml exists
    for config in [from_env, built_by_hand] {
        let app = create_router(AppState::new(config, "ws://localhost:7880"));
        let response = app
            .oneshot(Request::get("/Cargo.toml").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    Ok(())
}

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Join tokens
        .route("/token", post(handlers::issue_token))
        // Recording control
        .route("/start-recording", post(handlers::start_recording))
        .route("/stop-recording", post(handlers::stop_recording));

    // Classroom viewer page; never the working directory
    let viewer_dir = state
        .config
        .viewer_dir
        .as_ref()
        .filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = viewer_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        // The viewer runs in browsers on other origins
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! HTTP control API
//!
//! Stateless endpoints used by the classroom viewer and operators:
//! - POST /token - Issue a room join token
//! - POST /start-recording - Start a composite recording of a room
//! - POST /stop-recording - Stop a recording
//! - GET /health - Health check

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ErrorResponse};
pub use handlers::{
    StartRecordingRequest, StartRecordingResponse, StopRecordingRequest, StopRecordingResponse,
    TokenRequest, TokenResponse,
};
pub use routes::create_router;
pub use state::{AppState, ControlConfig};

//! HTTP API server
//!
//! This module provides the service's REST surface:
//! - GET / - readiness probe
//! - GET /record - record one clip from the microphone and return the transcript

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

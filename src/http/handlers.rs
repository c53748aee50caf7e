use super::state::AppState;
use crate::audio::{AudioClip, CaptureError};
use crate::stt::SttError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub transcription: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failure modes of one record→transcribe cycle.
enum RecordError {
    Capture(CaptureError),
    Stt(SttError),
}

/// Trips the capture cancel flag when dropped. The handler future is
/// dropped when the client disconnects mid-recording; this releases the
/// microphone instead of holding it for the full clip duration.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
/// Readiness probe
pub async fn index() -> impl IntoResponse {
    (StatusCode::OK, "Speech recognition API is running.")
}

/// GET /record
/// Record one clip from the default microphone and return its transcript
pub async fn record(State(state): State<AppState>) -> impl IntoResponse {
    // The microphone is a singleton physical resource: admit one recording
    // at a time and reject the rest outright so capture windows never
    // interleave.
    let _mic = match state.mic.try_lock() {
        Ok(guard) => guard,
        Err(_) => {
            warn!("rejecting /record: a recording is already in progress");
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "A recording is already in progress".to_string(),
                }),
            )
                .into_response();
        }
    };

    let spec = state.clip_spec;
    info!(
        "Recording audio for {:.0}s at {} Hz... speak now!",
        spec.duration.as_secs_f64(),
        spec.sample_rate
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_guard = CancelOnDrop(Arc::clone(&cancel));

    let engine = Arc::clone(&state.engine);
    let source = Arc::clone(&state.source);
    let clips_dir = state.clips_dir.clone();

    // Capture blocks for the full clip duration and decode is CPU-bound;
    // neither may run on the async executor.
    let outcome = tokio::task::spawn_blocking(move || -> Result<String, RecordError> {
        let clip = source
            .record_clip(&spec, &cancel)
            .map_err(RecordError::Capture)?;

        if let Some(dir) = clips_dir {
            archive_clip(&clip, &dir);
        }

        engine.transcribe(&clip).map_err(RecordError::Stt)
    })
    .await;

    // Cycle ran to completion; the flag only matters when the future is
    // dropped mid-capture.
    drop(cancel_guard);

    match outcome {
        Ok(Ok(text)) => {
            info!("transcription complete ({} chars)", text.len());
            (
                StatusCode::OK,
                Json(TranscriptionResponse {
                    transcription: text,
                }),
            )
                .into_response()
        }
        Ok(Err(RecordError::Stt(SttError::Rejected))) => {
            warn!("decoder rejected the captured waveform");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Unable to recognize speech".to_string(),
                }),
            )
                .into_response()
        }
        Ok(Err(RecordError::Capture(e))) => {
            error!("audio capture failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Audio capture failed: {e}"),
                }),
            )
                .into_response()
        }
        Ok(Err(RecordError::Stt(e))) => {
            error!("transcription failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Transcription failed: {e}"),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("record task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Recording task failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Best-effort WAV archive of a captured clip; failures are logged, never
/// surfaced to the client.
fn archive_clip(clip: &AudioClip, dir: &Path) {
    match clip.archive(dir) {
        Ok(path) => info!("archived clip to {}", path.display()),
        Err(e) => warn!("failed to archive clip: {e:#}"),
    }
}

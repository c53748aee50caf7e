// Integration tests for the HTTP surface
//
// The handlers are exercised through the real router with stub capture and
// recognition collaborators, so no microphone or model file is required.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use speech_server::audio::{AudioClip, CaptureError, ClipSource, ClipSpec};
use speech_server::stt::{SttEngine, SttError};
use speech_server::{create_router, AppState};
use tower::ServiceExt;

/// Clip source that returns a silent clip of exactly the requested length
/// and counts how often the device was opened.
struct SilentSource {
    captures: AtomicUsize,
}

impl SilentSource {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            captures: AtomicUsize::new(0),
        })
    }
}

impl ClipSource for SilentSource {
    fn record_clip(
        &self,
        spec: &ClipSpec,
        _cancel: &AtomicBool,
    ) -> Result<AudioClip, CaptureError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(AudioClip {
            samples: vec![0; spec.target_samples()],
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }
}

/// Clip source whose device is always unavailable.
struct FailingSource;

impl ClipSource for FailingSource {
    fn record_clip(
        &self,
        _spec: &ClipSpec,
        _cancel: &AtomicBool,
    ) -> Result<AudioClip, CaptureError> {
        Err(CaptureError::NoDevice)
    }
}

/// Recognition engine with a canned outcome.
struct StubEngine {
    outcome: Result<String, SttError>,
}

impl StubEngine {
    fn text(text: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(text.to_string()),
        })
    }

    fn err(err: SttError) -> Arc<Self> {
        Arc::new(Self { outcome: Err(err) })
    }
}

impl SttEngine for StubEngine {
    fn transcribe(&self, _clip: &AudioClip) -> Result<String, SttError> {
        self.outcome.clone()
    }
}

fn test_spec() -> ClipSpec {
    // Short clips keep the stubbed capture loop trivial.
    ClipSpec {
        sample_rate: 16000,
        channels: 1,
        duration: Duration::from_millis(100),
    }
}

fn test_state(engine: Arc<dyn SttEngine>, source: Arc<dyn ClipSource>) -> AppState {
    AppState::new(engine, source, test_spec(), None)
}

async fn get(state: AppState, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = create_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("response body should be valid JSON")
}

#[tokio::test]
async fn index_returns_readiness_message() {
    let state = test_state(StubEngine::text("unused"), SilentSource::new());

    let (status, body) = get(state, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Speech recognition API is running.");
}

#[tokio::test]
async fn record_returns_transcription() {
    let state = test_state(StubEngine::text("hello world"), SilentSource::new());

    let (status, body) = get(state, "/record").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["transcription"], "hello world");
}

#[tokio::test]
async fn record_empty_transcription_is_success() {
    // Silence decodes to an empty string, which is not an error.
    let state = test_state(StubEngine::text(""), SilentSource::new());

    let (status, body) = get(state, "/record").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["transcription"], "");
}

#[tokio::test]
async fn record_rejected_waveform_maps_to_400() {
    let state = test_state(StubEngine::err(SttError::Rejected), SilentSource::new());

    let (status, body) = get(state, "/record").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Unable to recognize speech");
}

#[tokio::test]
async fn record_capture_failure_maps_to_500() {
    let state = test_state(StubEngine::text("unused"), Arc::new(FailingSource));

    let (status, body) = get(state, "/record").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = json(&body)["error"].as_str().unwrap().to_string();
    assert!(error.contains("capture"), "unexpected error body: {error}");
}

#[tokio::test]
async fn record_decode_failure_maps_to_500() {
    let state = test_state(
        StubEngine::err(SttError::Transcription("inference failed".into())),
        SilentSource::new(),
    );

    let (status, body) = get(state, "/record").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = json(&body)["error"].as_str().unwrap().to_string();
    assert!(error.contains("inference failed"), "unexpected error body: {error}");
}

#[tokio::test]
async fn record_rejects_concurrent_recording_with_409() {
    let source = SilentSource::new();
    let state = test_state(StubEngine::text("unused"), source.clone());

    // Hold the microphone guard as an in-flight recording would.
    let _mic = state.mic.clone().lock_owned().await;

    let (status, body) = get(state.clone(), "/record").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["error"], "A recording is already in progress");
    // The rejected request never touched the device.
    assert_eq!(source.captures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeated_records_are_independent() {
    let source = SilentSource::new();
    let state = test_state(StubEngine::text("same every time"), source.clone());

    for _ in 0..3 {
        let (status, body) = get(state.clone(), "/record").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["transcription"], "same every time");
    }

    // Each request opened the device exactly once.
    assert_eq!(source.captures.load(Ordering::SeqCst), 3);
}

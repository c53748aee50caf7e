use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::audio::{ClipSource, ClipSpec};
use crate::stt::SttEngine;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded recognition engine, read-only for the process lifetime
    pub engine: Arc<dyn SttEngine>,
    /// Microphone clip source
    pub source: Arc<dyn ClipSource>,
    /// Fixed recording parameters (rate, channels, duration)
    pub clip_spec: ClipSpec,
    /// Directory for archived WAV clips, if enabled
    pub clips_dir: Option<PathBuf>,
    /// Single-slot admission guard for the physical microphone
    pub mic: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        engine: Arc<dyn SttEngine>,
        source: Arc<dyn ClipSource>,
        clip_spec: ClipSpec,
        clips_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            engine,
            source,
            clip_spec,
            clips_dir,
            mic: Arc::new(Mutex::new(())),
        }
    }
}

//! Recognition engine trait and the Whisper-backed implementation.
//!
//! [`SttEngine`] is the interface the request handler decodes through. It is
//! object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn SttEngine>` and shared across requests without locking.
//!
//! [`WhisperEngine`] wraps a `whisper_rs::WhisperContext` loaded once at
//! startup; every call creates a fresh decode state, so concurrent decodes
//! never share mutable state.

use std::path::Path;

use thiserror::Error;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::params::DecodeParams;
use crate::audio::AudioClip;

/// Sample rate the recognition model expects, in Hz.
pub const DECODE_SAMPLE_RATE: u32 = 16_000;

/// All errors that can arise from the recognition subsystem.
#[derive(Debug, Clone, Error)]
pub enum SttError {
    /// The model file was not found at the given path.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The engine failed to initialise from the model file.
    #[error("recognition context initialisation failed: {0}")]
    ContextInit(String),

    /// The clip's format does not match what the engine was built for.
    #[error("expected {expected_rate} Hz mono audio, got {rate} Hz / {channels} channel(s)")]
    UnsupportedFormat {
        expected_rate: u32,
        rate: u32,
        channels: u16,
    },

    /// The inference pass itself failed.
    #[error("transcription error: {0}")]
    Transcription(String),

    /// The decoder declined to finalize a transcript for the supplied clip.
    #[error("decoder did not accept the waveform")]
    Rejected,
}

/// Object-safe, thread-safe interface for speech-to-text engines.
///
/// # Contract
///
/// - The clip must be mono at [`DECODE_SAMPLE_RATE`]; anything else is
///   rejected with [`SttError::UnsupportedFormat`].
/// - An empty transcript is a valid success (silence is not an error).
/// - [`SttError::Rejected`] signals that the decoder could not finalize a
///   result from the supplied waveform.
pub trait SttEngine: Send + Sync {
    /// Decode one clip and return the transcript text.
    fn transcribe(&self, clip: &AudioClip) -> Result<String, SttError>;
}

// Compile-time assertion: Box<dyn SttEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SttEngine>) {}
};

/// Production engine that wraps a `whisper_rs::WhisperContext`.
///
/// A new `WhisperState` is created for every [`transcribe`] call so the
/// engine can be shared across threads without any locking.
///
/// [`transcribe`]: SttEngine::transcribe
pub struct WhisperEngine {
    ctx: WhisperContext,
    params: DecodeParams,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// `WhisperContext` holds a raw pointer internally but the model weights are
// read-only after loading; whisper-rs declares the context Send + Sync.
// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs.
unsafe impl Send for WhisperEngine {}
unsafe impl Sync for WhisperEngine {}

impl WhisperEngine {
    /// Load a GGML model from `model_path` and prepare it for inference.
    ///
    /// # Errors
    ///
    /// - [`SttError::ModelNotFound`] when `model_path` does not exist.
    /// - [`SttError::ContextInit`] when the model file could not be loaded.
    pub fn load(model_path: impl AsRef<Path>, params: DecodeParams) -> Result<Self, SttError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(SttError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            SttError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let ctx_params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        Ok(Self { ctx, params })
    }
}

impl SttEngine for WhisperEngine {
    fn transcribe(&self, clip: &AudioClip) -> Result<String, SttError> {
        if clip.sample_rate != DECODE_SAMPLE_RATE || clip.channels != 1 {
            return Err(SttError::UnsupportedFormat {
                expected_rate: DECODE_SAMPLE_RATE,
                rate: clip.sample_rate,
                channels: clip.channels,
            });
        }

        // The model consumes f32 PCM in [-1.0, 1.0].
        let audio: Vec<f32> = clip
            .samples
            .iter()
            .map(|&s| s as f32 / 32_768.0)
            .collect();

        let mut fp = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        // set_language takes an Option<&str> whose lifetime is tied to fp.
        // Both `fp` and the borrow of `self.params.language` remain alive
        // until state.full() returns, so the borrow is valid.
        let lang: Option<&str> = if self.params.language == "auto" {
            None
        } else {
            Some(self.params.language.as_str())
        };
        fp.set_language(lang);
        fp.set_n_threads(self.params.n_threads);
        fp.set_print_progress(false);
        fp.set_print_realtime(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        state
            .full(fp, &audio)
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))?;
            text.push_str(&segment);
        }

        Ok(text.trim().to_string())
    }
}

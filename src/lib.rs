pub mod audio;
pub mod config;
pub mod http;
pub mod stt;

pub use audio::{AudioClip, CaptureError, ClipSource, ClipSpec, CpalClipSource};
pub use config::Config;
pub use http::{create_router, AppState};
pub use stt::{DecodeParams, SttEngine, SttError, WhisperEngine};

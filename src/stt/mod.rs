pub mod engine;
pub mod params;

pub use engine::{SttEngine, SttError, WhisperEngine, DECODE_SAMPLE_RATE};
pub use params::DecodeParams;

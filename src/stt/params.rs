//! Decode parameter types.

/// Settings that control a single recognition pass.
///
/// Build with [`DecodeParams::default()`] and override fields as needed:
///
/// ```
/// use speech_server::stt::DecodeParams;
///
/// let params = DecodeParams {
///     language: "de".into(),
///     ..DecodeParams::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct DecodeParams {
    /// ISO-639-1 language code (e.g. `"en"`), or `"auto"` to let the model
    /// detect the language.
    pub language: String,

    /// Number of CPU threads handed to the decoder. Defaults to
    /// [`optimal_threads()`], capped at 8.
    pub n_threads: i32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            language: "en".into(),
            n_threads: optimal_threads(),
        }
    }
}

/// Returns the number of CPU threads to use for inference, capped at 8 to
/// avoid diminishing returns.
pub fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

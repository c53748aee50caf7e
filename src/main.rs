use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use speech_server::audio::CpalClipSource;
use speech_server::stt::{DecodeParams, WhisperEngine};
use speech_server::{create_router, AppState, Config};
use tracing::info;

/// Offline speech transcription over HTTP: GET /record captures a clip from
/// the default microphone and returns the decoded text as JSON.
#[derive(Debug, Parser)]
#[command(name = "speech-server", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config/speech-server")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Recording {}s clips at {} Hz, {} channel",
        cfg.audio.duration_secs, cfg.audio.sample_rate, cfg.audio.channels
    );
    info!("Loading speech model from {}", cfg.model.path);

    let mut params = DecodeParams {
        language: cfg.model.language.clone(),
        ..DecodeParams::default()
    };
    if let Some(threads) = cfg.model.threads {
        params.n_threads = threads;
    }

    // Model load is fatal: the server must not begin listening without it.
    let engine = WhisperEngine::load(&cfg.model.path, params)
        .context("Failed to load speech recognition model")?;

    let state = AppState::new(
        Arc::new(engine),
        Arc::new(CpalClipSource::new()),
        cfg.clip_spec(),
        cfg.audio.clips_dir.clone().map(Into::into),
    );

    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

use std::time::Duration;

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::audio::ClipSpec;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_secs: u64,
    /// Directory for archived WAV clips; archiving is off when unset.
    pub clips_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    /// Filesystem path to the GGML model file.
    pub path: String,
    /// ISO-639-1 language code, or "auto" for detection.
    pub language: String,
    /// Decode threads; derived from the CPU count when unset.
    pub threads: Option<i32>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Recording parameters derived from the audio section.
    pub fn clip_spec(&self) -> ClipSpec {
        ClipSpec {
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            duration: Duration::from_secs(self.audio.duration_secs),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            bail!("audio.sample_rate must be non-zero");
        }
        if self.audio.duration_secs == 0 {
            bail!("audio.duration_secs must be non-zero");
        }
        if self.audio.channels != 1 {
            bail!("audio.channels must be 1 (only mono capture is supported)");
        }
        Ok(())
    }
}

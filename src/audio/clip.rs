use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;

/// Parameters for one fixed-length recording.
#[derive(Debug, Clone, Copy)]
pub struct ClipSpec {
    /// Samples per second (16 kHz for the recognition engine).
    pub sample_rate: u32,
    /// Number of interleaved channels (1 = mono).
    pub channels: u16,
    /// How long the microphone is held open per request.
    pub duration: Duration,
}

impl ClipSpec {
    /// Total number of interleaved i16 samples a complete clip contains.
    pub fn target_samples(&self) -> usize {
        (self.sample_rate as f64 * self.duration.as_secs_f64()) as usize * self.channels as usize
    }
}

/// One captured recording: raw 16-bit PCM, owned by a single request.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Interleaved i16 PCM samples.
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl AudioClip {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Write the clip as a 16-bit PCM WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = hound::WavWriter::new(BufWriter::new(file), spec)
            .context("Failed to create WAV writer")?;

        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }

        writer.finalize().context("Failed to finalize WAV file")?;
        Ok(())
    }

    /// Write the clip into `dir` under a timestamped filename and return the
    /// resulting path.
    pub fn archive(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create clip directory {}", dir.display()))?;

        let filename = format!("clip-{}.wav", Utc::now().format("%Y%m%d-%H%M%S%.3f"));
        let path = dir.join(filename);
        self.write_wav(&path)?;
        Ok(path)
    }
}

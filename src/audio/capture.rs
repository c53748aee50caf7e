//! Microphone capture via `cpal`.
//!
//! [`ClipSource`] is the seam the request handler records through; the
//! production implementation [`CpalClipSource`] opens the default input
//! device for exactly one clip and releases it when the sample target is
//! reached. The capture call blocks for the full clip duration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;
use tracing::error;

use super::clip::{AudioClip, ClipSpec};

/// How long the device may go silent before capture is declared stalled.
const STALL_LIMIT: Duration = Duration::from_secs(2);

/// Errors that can occur while acquiring the device or recording a clip.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("audio device stopped delivering samples ({collected} of {target})")]
    Stalled { collected: usize, target: usize },

    #[error("recording cancelled before the clip completed")]
    Cancelled,
}

/// Blocking source of fixed-length microphone clips.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn ClipSource>` across request handlers.
pub trait ClipSource: Send + Sync {
    /// Record exactly `spec.target_samples()` interleaved i16 samples.
    ///
    /// Blocks the calling thread for the full clip duration. `cancel` is
    /// polled while samples accumulate; once it is set the device is
    /// released and [`CaptureError::Cancelled`] is returned.
    fn record_clip(&self, spec: &ClipSpec, cancel: &AtomicBool)
        -> Result<AudioClip, CaptureError>;
}

// Compile-time assertion: Arc<dyn ClipSource> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn ClipSource>) {}
};

/// Production clip source backed by the system default input device.
///
/// The host/device are re-acquired per call so a microphone that was
/// unplugged between requests surfaces as [`CaptureError::NoDevice`]
/// instead of a stale handle.
pub struct CpalClipSource;

impl CpalClipSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalClipSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipSource for CpalClipSource {
    fn record_clip(
        &self,
        spec: &ClipSpec,
        cancel: &AtomicBool,
    ) -> Result<AudioClip, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let config = cpal::StreamConfig {
            channels: spec.channels,
            sample_rate: cpal::SampleRate(spec.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, rx) = mpsc::channel::<Vec<i16>>();

        let stream = device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                // Ignore send errors; the receiver is gone once the clip
                // completed.
                let _ = tx.send(data.to_vec());
            },
            |err: cpal::StreamError| {
                error!("input stream error: {err}");
            },
            None,
        )?;

        stream.play()?;

        let target = spec.target_samples();
        let mut samples: Vec<i16> = Vec::with_capacity(target);

        while samples.len() < target {
            if cancel.load(Ordering::Relaxed) {
                return Err(CaptureError::Cancelled);
            }

            match rx.recv_timeout(STALL_LIMIT) {
                Ok(chunk) => samples.extend_from_slice(&chunk),
                Err(_) => {
                    return Err(CaptureError::Stalled {
                        collected: samples.len(),
                        target,
                    })
                }
            }
        }

        // Dropping the stream stops the hardware capture.
        drop(stream);

        // The last callback buffer usually overshoots the target.
        samples.truncate(target);

        Ok(AudioClip {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }
}

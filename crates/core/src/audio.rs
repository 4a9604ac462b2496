//! Audio clip types
//!
//! A clip is the raw learner recording attached to an utterance. The
//! assessment engine only needs its timing, so the clip keeps samples plus
//! enough metadata to derive duration.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Channels {
    #[default]
    Mono,
    Stereo,
}

impl Channels {
    pub fn count(&self) -> usize {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

/// Recorded learner audio
///
/// Samples are stored as f32 normalized to [-1.0, 1.0], interleaved when
/// stereo.
#[derive(Clone)]
pub struct AudioClip {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: Channels,
}

impl std::fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioClip")
            .field("samples_len", &self.samples.len())
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("duration", &self.duration())
            .finish()
    }
}

impl AudioClip {
    /// Create a clip from f32 samples
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: Channels) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels,
        }
    }

    /// Create a mono clip
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, Channels::Mono)
    }

    /// Create a silent mono clip of the given length, mostly useful in tests
    pub fn silence(duration: Duration, sample_rate: u32) -> Self {
        let len = (duration.as_secs_f64() * sample_rate as f64).round() as usize;
        Self::mono(vec![0.0; len], sample_rate)
    }

    /// Decode PCM16 little-endian bytes
    ///
    /// A trailing odd byte is ignored.
    pub fn from_pcm16_le(bytes: &[u8], sample_rate: u32, channels: Channels) -> Self {
        const PCM16_NORMALIZE: f32 = 32768.0;

        let samples: Vec<f32> = bytes
            .chunks_exact(2)
            .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]) as f32 / PCM16_NORMALIZE)
            .collect();

        Self::new(samples, sample_rate, channels)
    }

    /// Encode as PCM16 little-endian bytes (for upload to STT services)
    pub fn to_pcm16_le(&self) -> Vec<u8> {
        const PCM16_SCALE: f32 = 32767.0;

        self.samples
            .iter()
            .flat_map(|&sample| ((sample.clamp(-1.0, 1.0) * PCM16_SCALE) as i16).to_le_bytes())
            .collect()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration derived from buffer length and sample rate
    ///
    /// A zero sample rate yields a zero duration instead of dividing by zero.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as f64 / self.channels.count() as f64;
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }

    /// RMS energy in decibels, -96 dB for silence
    pub fn energy_db(&self) -> f32 {
        if self.samples.is_empty() {
            return -96.0;
        }

        let sum_squares: f32 = self.samples.iter().map(|s| s * s).sum();
        let rms = (sum_squares / self.samples.len() as f32).sqrt();

        if rms > 0.0 {
            20.0 * rms.log10()
        } else {
            -96.0
        }
    }
}

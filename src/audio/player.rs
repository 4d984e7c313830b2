//! Mono float playback on the default output device.

use std::sync::Arc;

use super::alsa_backend::{AlsaBackend, DEFAULT_DEVICE};
use super::audio_player::AudioPlayer;
use super::backend::{Backend, OutputStream, StreamParams, WriteStatus};
use super::context::AudioContext;
use crate::error::{Error, Result};

/// Player configuration.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Device selector. Accepted for interface compatibility; the system
    /// default output device is always used.
    pub device: String,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Frames per write call
    pub buffer_size: usize,
    /// After a retried write underflows again, write one buffer of silence
    /// to re-prime the device
    pub silence_prime: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            sample_rate: 48000,
            buffer_size: 1024,
            silence_prime: false,
        }
    }
}

/// Owns one running mono output stream.
///
/// Construction either yields a started stream or fails without retaining
/// anything. The stream is stopped and closed on drop; the shared library
/// context is left alone.
pub struct PcmPlayer<B: Backend = AlsaBackend> {
    // Keeps the library alive while the stream is open.
    _context: Arc<AudioContext<B>>,
    stream: Option<B::Stream>,
    device_name: String,
    rate: u32,
    buffer_size: usize,
    silence: Option<Vec<f32>>,
    underflows: u64,
}

impl<B: Backend> PcmPlayer<B> {
    /// Open and start a stream at `rate` Hz taking `buffer_size` frames per write.
    pub fn new(
        context: Arc<AudioContext<B>>,
        device: &str,
        rate: u32,
        buffer_size: usize,
    ) -> Result<Self> {
        let config = PlayerConfig {
            device: device.to_string(),
            sample_rate: rate,
            buffer_size,
            ..PlayerConfig::default()
        };
        Self::open(context, &config)
    }

    pub fn open(context: Arc<AudioContext<B>>, config: &PlayerConfig) -> Result<Self> {
        if config.sample_rate == 0 {
            return Err(Error::StreamOpen("sample rate must be non-zero".to_string()));
        }
        if config.buffer_size == 0 {
            return Err(Error::StreamOpen("buffer size must be non-zero".to_string()));
        }

        context.ensure_initialized()?;

        if !config.device.is_empty() && config.device != DEFAULT_DEVICE {
            log::debug!(
                "Device selector \"{}\" ignored, using the default output device",
                config.device
            );
        }

        let backend = context.backend();
        let device = backend
            .default_output_device()
            .map_err(|e| Error::Device(e.to_string()))?;

        let params = StreamParams {
            device: device.name.clone(),
            channels: 1,
            suggested_latency: device.default_high_output_latency,
            sample_rate: config.sample_rate,
            frames_per_buffer: config.buffer_size,
        };

        let mut stream = backend
            .open_output(&params)
            .map_err(|e| Error::StreamOpen(e.to_string()))?;

        if let Err(e) = stream.start() {
            stream.close();
            return Err(Error::StreamStart(e.to_string()));
        }

        log::info!(
            "Playback stream started: device={}, rate={}, buffer_size={}, latency={:?}",
            device.name,
            config.sample_rate,
            config.buffer_size,
            device.default_high_output_latency,
        );

        Ok(Self {
            _context: context,
            stream: Some(stream),
            device_name: device.name,
            rate: config.sample_rate,
            buffer_size: config.buffer_size,
            silence: config.silence_prime.then(|| vec![0.0; config.buffer_size]),
            underflows: 0,
        })
    }

    /// Write mono samples, blocking until the library accepts them.
    ///
    /// An underflow is retried once, resuming after the samples the device
    /// already accepted. Returns whether the final attempt completed.
    pub fn write(&mut self, samples: &[f32]) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };

        let resume_at = match stream.write(samples) {
            WriteStatus::Complete => return true,
            WriteStatus::Failed => return false,
            WriteStatus::Underflow { written } => {
                self.underflows += 1;
                written.min(samples.len())
            }
        };

        match stream.write(&samples[resume_at..]) {
            WriteStatus::Complete => true,
            WriteStatus::Failed => false,
            WriteStatus::Underflow { .. } => {
                self.underflows += 1;
                log::warn!(
                    "Playback underflow persisted after retry ({} total)",
                    self.underflows
                );
                if let Some(silence) = &self.silence {
                    match stream.write(silence) {
                        WriteStatus::Complete => {}
                        WriteStatus::Underflow { .. } => {
                            self.underflows += 1;
                            log::warn!("Silence prime underflowed");
                        }
                        WriteStatus::Failed => log::warn!("Silence prime write failed"),
                    }
                }
                false
            }
        }
    }

    /// Stop and close the stream. Later calls do nothing.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.stop() {
                log::warn!("Failed to stop playback stream: {}", e);
            }
            stream.close();
            log::info!("Playback stream closed: device={}", self.device_name);
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Underflow statuses seen so far, retries included.
    pub fn underflows(&self) -> u64 {
        self.underflows
    }
}

impl<B: Backend> AudioPlayer for PcmPlayer<B> {
    fn rate(&self) -> u32 {
        self.rate
    }

    fn write(&mut self, samples: &[f32]) -> bool {
        PcmPlayer::write(self, samples)
    }
}

impl<B: Backend> Drop for PcmPlayer<B> {
    fn drop(&mut self) {
        self.close();
    }
}

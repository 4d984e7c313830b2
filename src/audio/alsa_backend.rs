//! ALSA implementation of the playback backend.

use std::ffi::c_int;
use std::time::Duration;

use alsa::pcm::{Access, Format, Frames, HwParams, State, PCM};
use alsa::{Direction, ValueOr};

use super::backend::{Backend, BackendError, DeviceInfo, OutputStream, StreamParams, WriteStatus};

/// PCM name ALSA resolves to the system default output.
pub const DEFAULT_DEVICE: &str = "default";

/// ALSA has no per-device latency hint, so every device reports this one.
pub const DEFAULT_HIGH_OUTPUT_LATENCY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default)]
pub struct AlsaBackend;

impl Backend for AlsaBackend {
    type Stream = AlsaStream;

    fn initialize(&self) -> Result<(), BackendError> {
        // Loads the global configuration tree every PCM open resolves against
        let err = unsafe { alsa_sys::snd_config_update() };
        check(err, "snd_config_update")
    }

    fn terminate(&self) {
        let err = unsafe { alsa_sys::snd_config_update_free_global() };
        if let Err(e) = check(err, "snd_config_update_free_global") {
            log::warn!("Failed to release ALSA global configuration: {}", e);
        }
    }

    fn default_output_device(&self) -> Result<DeviceInfo, BackendError> {
        // Non-blocking so a busy device is reported instead of waited on.
        PCM::new(DEFAULT_DEVICE, Direction::Playback, true).map_err(|e| {
            BackendError(format!("cannot open PCM device '{}': {}", DEFAULT_DEVICE, e))
        })?;

        Ok(DeviceInfo {
            name: DEFAULT_DEVICE.to_string(),
            default_high_output_latency: DEFAULT_HIGH_OUTPUT_LATENCY,
        })
    }

    fn open_output(&self, params: &StreamParams) -> Result<AlsaStream, BackendError> {
        let pcm = PCM::new(&params.device, Direction::Playback, false).map_err(|e| {
            BackendError(format!("cannot open PCM device '{}': {}", params.device, e))
        })?;

        // Configure hardware parameters
        {
            let hwp = HwParams::any(&pcm)?;
            hwp.set_access(Access::RWInterleaved)?;
            hwp.set_format(Format::float())?;
            hwp.set_channels(params.channels)?;
            hwp.set_rate(params.sample_rate, ValueOr::Nearest)?;
            let period =
                hwp.set_period_size_near(params.frames_per_buffer as Frames, ValueOr::Nearest)?;
            let wanted = latency_frames(params.suggested_latency, params.sample_rate);
            hwp.set_buffer_size_near(buffer_frames(period, wanted))?;
            pcm.hw_params(&hwp)?;
        }

        // Read back actual negotiated parameters
        let (period_size, buffer_size) = {
            let hwp = pcm.hw_params_current()?;
            (hwp.get_period_size()?, hwp.get_buffer_size()?)
        };

        // Start playback once a full period is queued
        {
            let swp = pcm.sw_params_current()?;
            swp.set_start_threshold(period_size)?;
            pcm.sw_params(&swp)?;
        }

        log::info!(
            "ALSA Playback: device={}, rate={}, channels={}, period_size={}, buffer_size={}",
            params.device,
            params.sample_rate,
            params.channels,
            period_size,
            buffer_size,
        );

        Ok(AlsaStream {
            pcm,
            device: params.device.clone(),
        })
    }
}

/// Blocking ALSA playback handle for mono float samples.
pub struct AlsaStream {
    pcm: PCM,
    device: String,
}

impl OutputStream for AlsaStream {
    fn start(&mut self) -> Result<(), BackendError> {
        self.pcm.prepare()?;
        Ok(())
    }

    fn write(&mut self, samples: &[f32]) -> WriteStatus {
        let io = match self.pcm.io_f32() {
            Ok(io) => io,
            Err(e) => {
                log::error!("ALSA {}: float I/O unavailable: {}", self.device, e);
                return WriteStatus::Failed;
            }
        };

        // Mono, so frames and samples coincide.
        let mut written = 0;
        while written < samples.len() {
            match io.writei(&samples[written..]) {
                Ok(0) => return WriteStatus::Failed,
                Ok(n) => written += n,
                Err(e) => {
                    if self.pcm.state() != State::XRun {
                        log::error!("ALSA {}: playback error: {}", self.device, e);
                        return WriteStatus::Failed;
                    }
                    log::warn!("ALSA {}: XRUN, recovering...", self.device);
                    if let Err(e2) = self.pcm.prepare() {
                        log::error!("Failed to recover PCM playback: {}", e2);
                        return WriteStatus::Failed;
                    }
                    return WriteStatus::Underflow { written };
                }
            }
        }
        WriteStatus::Complete
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.pcm.drain()?;
        Ok(())
    }

    fn close(self) {
        log::debug!("ALSA {}: closing playback stream", self.device);
        drop(self.pcm);
    }
}

/// Map an ALSA return code (negative errno on failure) to a result.
fn check(err: c_int, what: &str) -> Result<(), BackendError> {
    if err < 0 {
        let cause = std::io::Error::from_raw_os_error(-err);
        Err(BackendError(format!("{} failed: {}", what, cause)))
    } else {
        Ok(())
    }
}

/// Frames needed to cover `latency` at `rate`.
fn latency_frames(latency: Duration, rate: u32) -> Frames {
    (latency.as_secs_f64() * f64::from(rate)).round() as Frames
}

/// Ring buffer size honouring the latency hint, never below double buffering.
fn buffer_frames(period: Frames, wanted: Frames) -> Frames {
    wanted.max(period * 2)
}
